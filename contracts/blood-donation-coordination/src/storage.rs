use crate::compatibility::{BloodGroup, Component};
use crate::eligibility::Gender;
use crate::error::ContractError;
use soroban_sdk::{contracttype, Address, Env, String, Vec};

pub const HOUR: u64 = 3_600;
pub const DAY: u64 = 86_400;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    pub matching_enabled: bool,
    /// Seconds an OPEN request stays open before it may be expired, per urgency
    pub critical_window: u64,
    pub high_window: u64,
    pub medium_window: u64,
    pub low_window: u64,
    pub max_units_per_request: u32,
    pub max_match_results: u32,
}

impl Config {
    pub fn with_defaults(admin: Address) -> Self {
        Config {
            admin,
            matching_enabled: true,
            critical_window: 24 * HOUR,
            high_window: 3 * DAY,
            medium_window: 7 * DAY,
            low_window: 14 * DAY,
            max_units_per_request: 20,
            max_match_results: 50,
        }
    }

    pub fn expiry_window(&self, urgency: Urgency) -> u64 {
        match urgency {
            Urgency::Critical => self.critical_window,
            Urgency::High => self.high_window,
            Urgency::Medium => self.medium_window,
            Urgency::Low => self.low_window,
        }
    }
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequestStatus {
    Open,
    Assigned,
    Fulfilled,
    Cancelled,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Fulfilled | RequestStatus::Cancelled | RequestStatus::Expired
        )
    }
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnitStatus {
    Available,
    Reserved,
    Issued,
    Expired,
    Tested,
    Quarantined,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OrganizationKind {
    Hospital,
    BloodBank,
}

/// Who answers a request: a donor giving blood or an organization supplying units
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Responder {
    Donor(Address),
    Organization(Address),
}

impl Responder {
    pub fn address(&self) -> Address {
        match self {
            Responder::Donor(address) | Responder::Organization(address) => address.clone(),
        }
    }
}

/// Latitude and longitude in micro-degrees
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeoPoint {
    pub lat: i64,
    pub lon: i64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Location {
    Unknown,
    At(GeoPoint),
}

/// Responder currently answering a request
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Assignment {
    Unassigned,
    To(Responder),
}

impl Assignment {
    pub fn is_held_by(&self, address: &Address) -> bool {
        match self {
            Assignment::Unassigned => false,
            Assignment::To(responder) => responder.address() == *address,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Organization {
    pub address: Address,
    pub name: String,
    pub kind: OrganizationKind,
    pub location: Location,
    pub is_active: bool,
    pub registered_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorProfile {
    pub address: Address,
    pub blood_group: BloodGroup,
    pub gender: Gender,
    pub last_donation: Option<u64>,
    pub deferred_until: Option<u64>,
    pub location: Location,
    pub donation_count: u32,
    pub is_active: bool,
    pub registered_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BloodRequest {
    pub id: u64,
    pub requester: Address,
    pub blood_group: BloodGroup,
    pub component: Component,
    pub units_needed: u32,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub assigned_to: Assignment,
    pub reserved_by: Option<Address>,
    pub units_reserved: u32,
    pub units_issued: u32,
    pub created_at: u64,
    pub assigned_at: Option<u64>,
    pub fulfilled_at: Option<u64>,
    pub cancelled_at: Option<u64>,
    pub expired_at: Option<u64>,
    pub cancel_reason: Option<String>,
    pub case_details: String,
    pub contact_info: String,
}

impl BloodRequest {
    /// Units still to be reserved or issued
    pub fn remaining_need(&self) -> u32 {
        self.units_needed
            .saturating_sub(self.units_reserved)
            .saturating_sub(self.units_issued)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BloodUnit {
    pub id: u64,
    pub owner: Address,
    pub barcode: String,
    pub blood_group: BloodGroup,
    pub component: Component,
    pub status: UnitStatus,
    pub collected_at: u64,
    pub expiry_date: u64,
    pub reserved_for: Option<u64>,
    pub reserved_at: Option<u64>,
    pub issued_at: Option<u64>,
    pub registered_at: u64,
}

impl BloodUnit {
    pub fn is_past_expiry(&self, now: u64) -> bool {
        now >= self.expiry_date
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorInterest {
    pub request_id: u64,
    pub donor: Address,
    pub expressed_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    RequestCounter,
    UnitCounter,
    BankCount,
    BankIndex(u32),
    Organization(Address),
    Donor(Address),
    Request(u64),
    Unit(u64),
    Barcode(String),
    OrgUnits(Address),
    OrgRequests(Address),
    RequestUnits(u64),
    RequestInterests(u64),
    Interest(u64, Address),
    DonorInterests(Address),
    ActiveRequests,
    RequestSweepCursor,
    UnitSweepCursor(Address),
}

// Config

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<Config, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
}

// Counters

pub fn next_request_id(env: &Env) -> u64 {
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::RequestCounter)
        .unwrap_or(0);
    let next = current + 1;
    env.storage().instance().set(&DataKey::RequestCounter, &next);
    next
}

pub fn next_unit_id(env: &Env) -> u64 {
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::UnitCounter)
        .unwrap_or(0);
    let next = current + 1;
    env.storage().instance().set(&DataKey::UnitCounter, &next);
    next
}

// Organizations

pub fn has_organization(env: &Env, org: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Organization(org.clone()))
}

pub fn get_organization(env: &Env, org: &Address) -> Result<Organization, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Organization(org.clone()))
        .ok_or(ContractError::OrganizationNotFound)
}

pub fn set_organization(env: &Env, organization: &Organization) {
    env.storage().persistent().set(
        &DataKey::Organization(organization.address.clone()),
        organization,
    );
}

/// Active blood bank lookup used by every inventory operation
pub fn get_active_bank(env: &Env, bank: &Address) -> Result<Organization, ContractError> {
    let organization = get_organization(env, bank)?;
    if organization.kind != OrganizationKind::BloodBank || !organization.is_active {
        return Err(ContractError::NotAuthorized);
    }
    Ok(organization)
}

pub fn bank_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::BankCount)
        .unwrap_or(0)
}

pub fn get_bank_by_index(env: &Env, index: u32) -> Option<Address> {
    env.storage().instance().get(&DataKey::BankIndex(index))
}

pub fn add_bank(env: &Env, bank: &Address) {
    let count = bank_count(env);
    env.storage()
        .instance()
        .set(&DataKey::BankIndex(count), bank);
    env.storage()
        .instance()
        .set(&DataKey::BankCount, &(count + 1));
}

// Donors

pub fn has_donor(env: &Env, donor: &Address) -> bool {
    env.storage().persistent().has(&DataKey::Donor(donor.clone()))
}

pub fn get_donor(env: &Env, donor: &Address) -> Result<DonorProfile, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Donor(donor.clone()))
        .ok_or(ContractError::DonorNotFound)
}

pub fn set_donor(env: &Env, donor: &DonorProfile) {
    env.storage()
        .persistent()
        .set(&DataKey::Donor(donor.address.clone()), donor);
}

// Requests

pub fn get_request(env: &Env, request_id: u64) -> Result<BloodRequest, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Request(request_id))
        .ok_or(ContractError::RequestNotFound)
}

pub fn set_request(env: &Env, request: &BloodRequest) {
    env.storage()
        .persistent()
        .set(&DataKey::Request(request.id), request);
}

pub fn get_org_requests(env: &Env, org: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::OrgRequests(org.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn add_org_request(env: &Env, org: &Address, request_id: u64) {
    let mut requests = get_org_requests(env, org);
    requests.push_back(request_id);
    env.storage()
        .persistent()
        .set(&DataKey::OrgRequests(org.clone()), &requests);
}

/// OPEN and ASSIGNED requests, scanned by the expiry sweep
pub fn get_active_requests(env: &Env) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::ActiveRequests)
        .unwrap_or(Vec::new(env))
}

pub fn add_active_request(env: &Env, request_id: u64) {
    let mut requests = get_active_requests(env);
    requests.push_back(request_id);
    env.storage()
        .persistent()
        .set(&DataKey::ActiveRequests, &requests);
}

pub fn remove_active_request(env: &Env, request_id: u64) {
    let mut requests = get_active_requests(env);
    if let Some(index) = requests.first_index_of(request_id) {
        requests.remove(index);
        env.storage()
            .persistent()
            .set(&DataKey::ActiveRequests, &requests);
    }
}

// Units

pub fn get_unit(env: &Env, unit_id: u64) -> Result<BloodUnit, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Unit(unit_id))
        .ok_or(ContractError::UnitNotFound)
}

pub fn set_unit(env: &Env, unit: &BloodUnit) {
    env.storage().persistent().set(&DataKey::Unit(unit.id), unit);
}

pub fn remove_unit(env: &Env, unit: &BloodUnit) {
    env.storage().persistent().remove(&DataKey::Unit(unit.id));
    env.storage()
        .persistent()
        .remove(&DataKey::Barcode(unit.barcode.clone()));

    let mut units = get_org_units(env, &unit.owner);
    if let Some(index) = units.first_index_of(unit.id) {
        units.remove(index);
        env.storage()
            .persistent()
            .set(&DataKey::OrgUnits(unit.owner.clone()), &units);
    }
}

pub fn has_barcode(env: &Env, barcode: &String) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Barcode(barcode.clone()))
}

pub fn set_barcode(env: &Env, barcode: &String, unit_id: u64) {
    env.storage()
        .persistent()
        .set(&DataKey::Barcode(barcode.clone()), &unit_id);
}

pub fn get_org_units(env: &Env, org: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::OrgUnits(org.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn add_org_unit(env: &Env, org: &Address, unit_id: u64) {
    let mut units = get_org_units(env, org);
    units.push_back(unit_id);
    env.storage()
        .persistent()
        .set(&DataKey::OrgUnits(org.clone()), &units);
}

/// Every unit ever reserved against a request, including released and issued ones
pub fn get_request_units(env: &Env, request_id: u64) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::RequestUnits(request_id))
        .unwrap_or(Vec::new(env))
}

pub fn add_request_units(env: &Env, request_id: u64, unit_ids: &Vec<u64>) {
    let mut units = get_request_units(env, request_id);
    for unit_id in unit_ids.iter() {
        if !units.contains(unit_id) {
            units.push_back(unit_id);
        }
    }
    env.storage()
        .persistent()
        .set(&DataKey::RequestUnits(request_id), &units);
}

// Donor interests

pub fn get_interest(env: &Env, request_id: u64, donor: &Address) -> Option<DonorInterest> {
    env.storage()
        .persistent()
        .get(&DataKey::Interest(request_id, donor.clone()))
}

pub fn get_request_interests(env: &Env, request_id: u64) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::RequestInterests(request_id))
        .unwrap_or(Vec::new(env))
}

pub fn get_donor_interests(env: &Env, donor: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::DonorInterests(donor.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn add_interest(env: &Env, interest: &DonorInterest) {
    env.storage().persistent().set(
        &DataKey::Interest(interest.request_id, interest.donor.clone()),
        interest,
    );

    let mut donors = get_request_interests(env, interest.request_id);
    donors.push_back(interest.donor.clone());
    env.storage()
        .persistent()
        .set(&DataKey::RequestInterests(interest.request_id), &donors);

    let mut requests = get_donor_interests(env, &interest.donor);
    requests.push_back(interest.request_id);
    env.storage()
        .persistent()
        .set(&DataKey::DonorInterests(interest.donor.clone()), &requests);
}

pub fn remove_interest(env: &Env, request_id: u64, donor: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Interest(request_id, donor.clone()));

    let mut donors = get_request_interests(env, request_id);
    if let Some(index) = donors.first_index_of(donor) {
        donors.remove(index);
        env.storage()
            .persistent()
            .set(&DataKey::RequestInterests(request_id), &donors);
    }

    let mut requests = get_donor_interests(env, donor);
    if let Some(index) = requests.first_index_of(request_id) {
        requests.remove(index);
        env.storage()
            .persistent()
            .set(&DataKey::DonorInterests(donor.clone()), &requests);
    }
}

// Sweep cursors

/// Position in the active request list where the next expiry sweep starts
pub fn get_request_sweep_cursor(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::RequestSweepCursor)
        .unwrap_or(0)
}

pub fn set_request_sweep_cursor(env: &Env, cursor: u32) {
    env.storage()
        .instance()
        .set(&DataKey::RequestSweepCursor, &cursor);
}

pub fn get_unit_sweep_cursor(env: &Env, bank: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::UnitSweepCursor(bank.clone()))
        .unwrap_or(0)
}

pub fn set_unit_sweep_cursor(env: &Env, bank: &Address, cursor: u32) {
    env.storage()
        .persistent()
        .set(&DataKey::UnitSweepCursor(bank.clone()), &cursor);
}
