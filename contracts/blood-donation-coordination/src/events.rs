use crate::compatibility::{BloodGroup, Component};
use crate::storage::{Assignment, OrganizationKind, RequestStatus, UnitStatus, Urgency};
use soroban_sdk::{contracttype, symbol_short, Address, Env, String, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestCreatedEvent {
    pub request_id: u64,
    pub requester: Address,
    pub blood_group: BloodGroup,
    pub component: Component,
    pub units_needed: u32,
    pub urgency: Urgency,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestStatusEvent {
    pub request_id: u64,
    pub old_status: RequestStatus,
    pub new_status: RequestStatus,
    pub responder: Assignment,
    pub reason: Option<String>,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterestEvent {
    pub request_id: u64,
    pub donor: Address,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitsMovedEvent {
    pub request_id: u64,
    pub bank: Address,
    pub unit_ids: Vec<u64>,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitRegisteredEvent {
    pub unit_id: u64,
    pub bank: Address,
    pub blood_group: BloodGroup,
    pub component: Component,
    pub expiry_date: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitStatusEvent {
    pub unit_id: u64,
    pub old_status: UnitStatus,
    pub new_status: UnitStatus,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorEvent {
    pub donor: Address,
    pub blood_group: BloodGroup,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrganizationEvent {
    pub organization: Address,
    pub kind: OrganizationKind,
    pub is_active: bool,
    pub timestamp: u64,
}

/// Broadcast to compatible donors and banks listening off-chain
pub fn emit_request_created(
    env: &Env,
    request_id: u64,
    requester: Address,
    blood_group: BloodGroup,
    component: Component,
    units_needed: u32,
    urgency: Urgency,
) {
    let event = RequestCreatedEvent {
        request_id,
        requester,
        blood_group,
        component,
        units_needed,
        urgency,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("req_new"), request_id), event);
}

pub fn emit_request_status(
    env: &Env,
    request_id: u64,
    old_status: RequestStatus,
    new_status: RequestStatus,
    responder: Assignment,
    reason: Option<String>,
) {
    let event = RequestStatusEvent {
        request_id,
        old_status,
        new_status,
        responder,
        reason,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("req_stat"), request_id), event);
}

pub fn emit_interest_expressed(env: &Env, request_id: u64, donor: Address) {
    let event = InterestEvent {
        request_id,
        donor,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("interest"), request_id), event);
}

pub fn emit_interest_withdrawn(env: &Env, request_id: u64, donor: Address) {
    let event = InterestEvent {
        request_id,
        donor,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("withdrawn"), request_id), event);
}

pub fn emit_units_reserved(env: &Env, request_id: u64, bank: Address, unit_ids: Vec<u64>) {
    let event = UnitsMovedEvent {
        request_id,
        bank,
        unit_ids,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("reserved"), request_id), event);
}

pub fn emit_units_released(env: &Env, request_id: u64, bank: Address, unit_ids: Vec<u64>) {
    let event = UnitsMovedEvent {
        request_id,
        bank,
        unit_ids,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("released"), request_id), event);
}

pub fn emit_units_issued(env: &Env, request_id: u64, bank: Address, unit_ids: Vec<u64>) {
    let event = UnitsMovedEvent {
        request_id,
        bank,
        unit_ids,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("issued"), request_id), event);
}

pub fn emit_unit_registered(
    env: &Env,
    unit_id: u64,
    bank: Address,
    blood_group: BloodGroup,
    component: Component,
    expiry_date: u64,
) {
    let event = UnitRegisteredEvent {
        unit_id,
        bank,
        blood_group,
        component,
        expiry_date,
    };
    env.events()
        .publish((symbol_short!("unit_new"), unit_id), event);
}

pub fn emit_unit_status(env: &Env, unit_id: u64, old_status: UnitStatus, new_status: UnitStatus) {
    let event = UnitStatusEvent {
        unit_id,
        old_status,
        new_status,
        timestamp: env.ledger().timestamp(),
    };
    env.events()
        .publish((symbol_short!("unit_stat"), unit_id), event);
}

pub fn emit_unit_purged(env: &Env, unit_id: u64, old_status: UnitStatus) {
    env.events()
        .publish((symbol_short!("unit_purg"), unit_id), old_status);
}

pub fn emit_donor_registered(env: &Env, donor: Address, blood_group: BloodGroup) {
    let event = DonorEvent {
        donor,
        blood_group,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish((symbol_short!("donor_new"),), event);
}

pub fn emit_donation_recorded(env: &Env, donor: Address, bank: Address, donated_at: u64) {
    env.events()
        .publish((symbol_short!("donation"), donor), (bank, donated_at));
}

pub fn emit_deferral_changed(env: &Env, donor: Address, deferred_until: Option<u64>) {
    env.events()
        .publish((symbol_short!("deferral"), donor), deferred_until);
}

pub fn emit_organization_changed(
    env: &Env,
    organization: Address,
    kind: OrganizationKind,
    is_active: bool,
) {
    let event = OrganizationEvent {
        organization,
        kind,
        is_active,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish((symbol_short!("org"),), event);
}

pub fn emit_config_updated(env: &Env, admin: Address) {
    env.events().publish((symbol_short!("config"),), admin);
}
