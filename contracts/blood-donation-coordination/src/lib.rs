#![no_std]

mod compatibility;
mod eligibility;
mod error;
mod events;
mod inventory;
mod matching;
mod reconcile;
mod registry;
mod request;
mod storage;
mod utils;

#[cfg(test)]
mod tests;

use soroban_sdk::{contract, contractimpl, Address, Env, String, Vec};

pub use compatibility::{BloodGroup, Component};
pub use eligibility::Gender;
pub use error::ContractError;
pub use matching::{BankMatch, DonorMatch, MatchResult};
pub use storage::{
    Assignment, BloodRequest, BloodUnit, Config, DonorInterest, DonorProfile, GeoPoint, Location,
    Organization, OrganizationKind, RequestStatus, Responder, UnitStatus, Urgency,
};

#[contract]
pub struct BloodDonationCoordination;

#[contractimpl]
impl BloodDonationCoordination {
    /// Initialize the contract with an admin and default configuration
    pub fn initialize(env: Env, admin: Address) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        admin.require_auth();

        storage::set_config(&env, &Config::with_defaults(admin));
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        storage::get_config(&env)
    }

    /// Replace expiry windows and limits (admin only; the admin itself is fixed)
    pub fn update_config(env: Env, caller: Address, config: Config) -> Result<(), ContractError> {
        caller.require_auth();
        let current = utils::require_admin(&env, &caller)?;

        if config.admin != current.admin {
            return Err(ContractError::InvalidInput);
        }
        if config.critical_window == 0
            || config.high_window == 0
            || config.medium_window == 0
            || config.low_window == 0
            || config.max_units_per_request == 0
            || config.max_match_results == 0
        {
            return Err(ContractError::InvalidInput);
        }

        storage::set_config(&env, &config);
        events::emit_config_updated(&env, caller);
        Ok(())
    }

    /// Turn matching on or off without touching the rest of the config
    pub fn set_matching_enabled(
        env: Env,
        caller: Address,
        enabled: bool,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        let mut config = utils::require_admin(&env, &caller)?;

        config.matching_enabled = enabled;
        storage::set_config(&env, &config);
        events::emit_config_updated(&env, caller);
        Ok(())
    }

    // Organizations

    pub fn register_organization(
        env: Env,
        caller: Address,
        org: Address,
        name: String,
        kind: OrganizationKind,
        location: Location,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        registry::register_organization(&env, &caller, org, name, kind, location)
    }

    pub fn deactivate_organization(
        env: Env,
        caller: Address,
        org: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        registry::deactivate_organization(&env, &caller, org)
    }

    pub fn get_organization(env: Env, org: Address) -> Result<Organization, ContractError> {
        storage::get_organization(&env, &org)
    }

    // Donors

    pub fn register_donor(
        env: Env,
        donor: Address,
        blood_group: BloodGroup,
        gender: Gender,
        last_donation: Option<u64>,
        location: Location,
    ) -> Result<(), ContractError> {
        donor.require_auth();
        registry::register_donor(&env, donor, blood_group, gender, last_donation, location)
    }

    /// Record a donation collected by a blood bank
    pub fn record_donation(
        env: Env,
        bank: Address,
        donor: Address,
        donated_at: u64,
    ) -> Result<(), ContractError> {
        bank.require_auth();
        registry::record_donation(&env, bank, donor, donated_at)
    }

    /// Set or clear a medical deferral (admin only)
    pub fn set_donor_deferral(
        env: Env,
        caller: Address,
        donor: Address,
        deferred_until: Option<u64>,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        registry::set_donor_deferral(&env, &caller, donor, deferred_until)
    }

    pub fn update_donor_location(
        env: Env,
        donor: Address,
        location: Location,
    ) -> Result<(), ContractError> {
        donor.require_auth();
        registry::update_donor_location(&env, donor, location)
    }

    pub fn get_donor(env: Env, donor: Address) -> Result<DonorProfile, ContractError> {
        storage::get_donor(&env, &donor)
    }

    pub fn is_donor_eligible(env: Env, donor: Address) -> Result<bool, ContractError> {
        registry::is_donor_eligible(&env, &donor)
    }

    pub fn next_eligible_date(env: Env, donor: Address) -> Result<u64, ContractError> {
        registry::next_eligible_date(&env, &donor)
    }

    // Compatibility

    /// Groups that can receive red cells from `donor`
    pub fn compatible_recipients(env: Env, donor: BloodGroup) -> Vec<BloodGroup> {
        compatibility::compatible_recipients(&env, donor)
    }

    /// Groups `recipient` can accept red cells from
    pub fn compatible_donors(env: Env, recipient: BloodGroup) -> Vec<BloodGroup> {
        compatibility::compatible_donors(&env, recipient)
    }

    pub fn parse_blood_group(_env: Env, code: String) -> Result<BloodGroup, ContractError> {
        compatibility::parse_blood_group(&code)
    }

    pub fn blood_group_code(env: Env, blood_group: BloodGroup) -> String {
        compatibility::blood_group_code(&env, blood_group)
    }

    pub fn is_unit_compatible(
        _env: Env,
        unit_group: BloodGroup,
        request_group: BloodGroup,
        component: Component,
    ) -> bool {
        compatibility::is_unit_compatible(unit_group, request_group, component)
    }

    // Requests

    /// Post a new OPEN request and broadcast it
    pub fn create_request(
        env: Env,
        requester: Address,
        blood_group: BloodGroup,
        component: Component,
        units_needed: u32,
        urgency: Urgency,
        case_details: String,
        contact_info: String,
    ) -> Result<u64, ContractError> {
        requester.require_auth();
        request::create_request(
            &env,
            requester,
            blood_group,
            component,
            units_needed,
            urgency,
            case_details,
            contact_info,
        )
    }

    /// Assign a compatible donor or blood bank to an OPEN request
    pub fn assign(
        env: Env,
        request_id: u64,
        caller: Address,
        responder: Responder,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        request::assign(&env, request_id, &caller, responder)
    }

    pub fn fulfill(env: Env, request_id: u64, caller: Address) -> Result<(), ContractError> {
        caller.require_auth();
        request::fulfill(&env, request_id, &caller)
    }

    pub fn cancel(
        env: Env,
        request_id: u64,
        caller: Address,
        reason: String,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        request::cancel(&env, request_id, &caller, reason)
    }

    /// Expire an overdue OPEN request; callable by anyone
    pub fn expire(env: Env, request_id: u64) -> Result<(), ContractError> {
        request::expire(&env, request_id)
    }

    pub fn express_interest(env: Env, request_id: u64, donor: Address) -> Result<(), ContractError> {
        donor.require_auth();
        request::express_interest(&env, request_id, donor)
    }

    pub fn withdraw_interest(
        env: Env,
        request_id: u64,
        donor: Address,
    ) -> Result<(), ContractError> {
        donor.require_auth();
        request::withdraw_interest(&env, request_id, donor)
    }

    pub fn get_request(env: Env, request_id: u64) -> Result<BloodRequest, ContractError> {
        storage::get_request(&env, request_id)
    }

    pub fn get_request_interests(
        env: Env,
        request_id: u64,
    ) -> Result<Vec<DonorInterest>, ContractError> {
        storage::get_request(&env, request_id)?;
        let mut interests = Vec::new(&env);
        for donor in storage::get_request_interests(&env, request_id).iter() {
            if let Some(interest) = storage::get_interest(&env, request_id, &donor) {
                interests.push_back(interest);
            }
        }
        Ok(interests)
    }

    /// Units ever reserved against the request, whatever their current status
    pub fn get_request_units(env: Env, request_id: u64) -> Result<Vec<BloodUnit>, ContractError> {
        storage::get_request(&env, request_id)?;
        let mut units = Vec::new(&env);
        for unit_id in storage::get_request_units(&env, request_id).iter() {
            if let Ok(unit) = storage::get_unit(&env, unit_id) {
                units.push_back(unit);
            }
        }
        Ok(units)
    }

    pub fn get_organization_requests(env: Env, org: Address) -> Vec<u64> {
        storage::get_org_requests(&env, &org)
    }

    pub fn get_active_requests(env: Env) -> Vec<u64> {
        storage::get_active_requests(&env)
    }

    pub fn get_donor_interests(env: Env, donor: Address) -> Vec<u64> {
        storage::get_donor_interests(&env, &donor)
    }

    // Inventory

    pub fn register_unit(
        env: Env,
        bank: Address,
        barcode: String,
        blood_group: BloodGroup,
        component: Component,
        collected_at: u64,
        expiry_date: u64,
        initial_status: UnitStatus,
    ) -> Result<u64, ContractError> {
        bank.require_auth();
        inventory::register_unit(
            &env,
            bank,
            barcode,
            blood_group,
            component,
            collected_at,
            expiry_date,
            initial_status,
        )
    }

    pub fn update_unit_status(
        env: Env,
        bank: Address,
        unit_id: u64,
        status: UnitStatus,
    ) -> Result<(), ContractError> {
        bank.require_auth();
        inventory::update_unit_status(&env, bank, unit_id, status)
    }

    /// Reserve AVAILABLE units of `bank` for a request in one step
    pub fn reserve_units(
        env: Env,
        request_id: u64,
        bank: Address,
        unit_ids: Vec<u64>,
    ) -> Result<(), ContractError> {
        bank.require_auth();
        inventory::reserve_units(&env, request_id, bank, unit_ids)
    }

    /// Release reserved units; already AVAILABLE units are skipped
    pub fn release_reservation(
        env: Env,
        request_id: u64,
        bank: Address,
        unit_ids: Vec<u64>,
    ) -> Result<u32, ContractError> {
        bank.require_auth();
        inventory::release_reservation(&env, request_id, bank, unit_ids)
    }

    pub fn issue_units(
        env: Env,
        request_id: u64,
        bank: Address,
        unit_ids: Vec<u64>,
    ) -> Result<(), ContractError> {
        bank.require_auth();
        inventory::issue_units(&env, request_id, bank, unit_ids)
    }

    pub fn expire_unit(env: Env, unit_id: u64) -> Result<(), ContractError> {
        inventory::expire_unit(&env, unit_id)
    }

    pub fn purge_unit(env: Env, caller: Address, unit_id: u64) -> Result<(), ContractError> {
        caller.require_auth();
        inventory::purge_unit(&env, &caller, unit_id)
    }

    pub fn get_unit(env: Env, unit_id: u64) -> Result<BloodUnit, ContractError> {
        storage::get_unit(&env, unit_id)
    }

    pub fn get_organization_units(env: Env, org: Address) -> Vec<u64> {
        storage::get_org_units(&env, &org)
    }

    pub fn count_available_units(
        env: Env,
        bank: Address,
        blood_group: BloodGroup,
        component: Component,
    ) -> Result<u32, ContractError> {
        inventory::count_available_units(&env, bank, blood_group, component)
    }

    // Matching

    /// Rank compatible donors and blood banks for an OPEN request
    pub fn find_matches(env: Env, request_id: u64) -> Result<MatchResult, ContractError> {
        matching::find_matches(&env, request_id)
    }

    // Maintenance

    /// Scan up to `limit` active requests from a rotating cursor and expire the overdue ones
    pub fn sweep_expired_requests(env: Env, limit: u32) -> Result<u32, ContractError> {
        reconcile::sweep_expired_requests(&env, limit)
    }

    /// Scan up to `limit` units of `bank` from a rotating cursor and expire the stale ones
    pub fn sweep_expired_units(env: Env, bank: Address, limit: u32) -> Result<u32, ContractError> {
        reconcile::sweep_expired_units(&env, bank, limit)
    }

    pub fn reconcile_request(env: Env, request_id: u64) -> Result<u32, ContractError> {
        reconcile::reconcile_request(&env, request_id)
    }
}
