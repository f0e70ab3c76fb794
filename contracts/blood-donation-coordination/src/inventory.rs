// inventory.rs - Blood unit inventory and reservation workflow
// Units move AVAILABLE -> RESERVED -> ISSUED against a request. Every operation checks all
// selected units before writing any of them, so a failed call leaves inventory untouched.

use crate::compatibility::{is_unit_compatible, BloodGroup, Component};
use crate::events;
use crate::request;
use crate::storage::{
    self, Assignment, BloodRequest, BloodUnit, RequestStatus, Responder, UnitStatus,
};
use crate::utils;
use crate::ContractError;
use soroban_sdk::{Address, Env, String, Vec};

pub fn register_unit(
    env: &Env,
    bank: Address,
    barcode: String,
    blood_group: BloodGroup,
    component: Component,
    collected_at: u64,
    expiry_date: u64,
    initial_status: UnitStatus,
) -> Result<u64, ContractError> {
    storage::get_active_bank(env, &bank)?;
    utils::validate_text(&barcode, false)?;

    match initial_status {
        UnitStatus::Available | UnitStatus::Tested | UnitStatus::Quarantined => {}
        _ => return Err(ContractError::InvalidInput),
    }

    let now = env.ledger().timestamp();
    if collected_at >= expiry_date || collected_at > now {
        return Err(ContractError::InvalidInput);
    }
    if expiry_date <= now {
        return Err(ContractError::UnitExpired);
    }
    if storage::has_barcode(env, &barcode) {
        return Err(ContractError::DuplicateBarcode);
    }

    let unit_id = storage::next_unit_id(env);
    let unit = BloodUnit {
        id: unit_id,
        owner: bank.clone(),
        barcode: barcode.clone(),
        blood_group,
        component,
        status: initial_status,
        collected_at,
        expiry_date,
        reserved_for: None,
        reserved_at: None,
        issued_at: None,
        registered_at: now,
    };

    storage::set_unit(env, &unit);
    storage::set_barcode(env, &barcode, unit_id);
    storage::add_org_unit(env, &bank, unit_id);

    events::emit_unit_registered(env, unit_id, bank, blood_group, component, expiry_date);
    Ok(unit_id)
}

/// Lab driven transitions outside the reservation workflow
pub fn update_unit_status(
    env: &Env,
    bank: Address,
    unit_id: u64,
    new_status: UnitStatus,
) -> Result<(), ContractError> {
    let mut unit = storage::get_unit(env, unit_id)?;
    if unit.owner != bank {
        return Err(ContractError::NotAuthorized);
    }

    let allowed = matches!(
        (unit.status, new_status),
        (UnitStatus::Tested, UnitStatus::Available)
            | (UnitStatus::Tested, UnitStatus::Quarantined)
            | (UnitStatus::Quarantined, UnitStatus::Available)
            | (UnitStatus::Quarantined, UnitStatus::Expired)
            | (UnitStatus::Available, UnitStatus::Quarantined)
    );
    if !allowed {
        return Err(ContractError::InvalidState);
    }

    if new_status == UnitStatus::Available && unit.is_past_expiry(env.ledger().timestamp()) {
        return Err(ContractError::UnitExpired);
    }

    let old_status = unit.status;
    unit.status = new_status;
    storage::set_unit(env, &unit);

    events::emit_unit_status(env, unit_id, old_status, new_status);
    Ok(())
}

fn ensure_request_accepts_units(request: &BloodRequest) -> Result<(), ContractError> {
    match request.status {
        RequestStatus::Open | RequestStatus::Assigned => Ok(()),
        _ => Err(ContractError::InvalidState),
    }
}

/// Once a request is assigned, only the assigned blood bank moves units for it
fn ensure_assigned_bank(request: &BloodRequest, bank: &Address) -> Result<(), ContractError> {
    match &request.assigned_to {
        Assignment::Unassigned => Ok(()),
        Assignment::To(Responder::Organization(org)) if org == bank => Ok(()),
        Assignment::To(_) => Err(ContractError::InvalidState),
    }
}

fn ensure_distinct(unit_ids: &Vec<u64>) -> Result<(), ContractError> {
    if unit_ids.is_empty() {
        return Err(ContractError::InvalidInput);
    }
    for (index, unit_id) in unit_ids.iter().enumerate() {
        if unit_ids.first_index_of(unit_id) != Some(index as u32) {
            return Err(ContractError::InvalidInput);
        }
    }
    Ok(())
}

/// Reserve specific AVAILABLE units of `bank` against a request
pub fn reserve_units(
    env: &Env,
    request_id: u64,
    bank: Address,
    unit_ids: Vec<u64>,
) -> Result<(), ContractError> {
    storage::get_active_bank(env, &bank)?;
    let mut request = storage::get_request(env, request_id)?;
    ensure_request_accepts_units(&request)?;

    if request.requester == bank {
        return Err(ContractError::SelfFulfillment);
    }
    ensure_assigned_bank(&request, &bank)?;
    if let Some(holder) = &request.reserved_by {
        if *holder != bank && request.units_reserved > 0 {
            return Err(ContractError::InvalidState);
        }
    }

    ensure_distinct(&unit_ids)?;
    if unit_ids.len() > request.units_needed {
        return Err(ContractError::InsufficientUnits);
    }

    let now = env.ledger().timestamp();
    let mut selected: Vec<BloodUnit> = Vec::new(env);
    for unit_id in unit_ids.iter() {
        let unit = storage::get_unit(env, unit_id)?;
        if unit.owner != bank {
            return Err(ContractError::NotAuthorized);
        }
        if unit.status != UnitStatus::Available {
            return Err(ContractError::AlreadyReserved);
        }
        if unit.is_past_expiry(now) {
            return Err(ContractError::UnitExpired);
        }
        if unit.component != request.component {
            return Err(ContractError::ComponentMismatch);
        }
        if !is_unit_compatible(unit.blood_group, request.blood_group, request.component) {
            return Err(ContractError::IncompatibleBloodGroup);
        }
        selected.push_back(unit);
    }

    // Checked after the units so a unit already held reports AlreadyReserved
    if selected.len() > request.remaining_need() {
        return Err(ContractError::InsufficientUnits);
    }

    for mut unit in selected.iter() {
        unit.status = UnitStatus::Reserved;
        unit.reserved_for = Some(request_id);
        unit.reserved_at = Some(now);
        storage::set_unit(env, &unit);
    }

    request.units_reserved += selected.len();
    request.reserved_by = Some(bank.clone());
    storage::set_request(env, &request);
    storage::add_request_units(env, request_id, &unit_ids);

    events::emit_units_reserved(env, request_id, bank, unit_ids);
    Ok(())
}

/// Return RESERVED units to AVAILABLE and update the request counters
fn release_units(env: &Env, request: &mut BloodRequest, units: &Vec<BloodUnit>) {
    for mut unit in units.iter() {
        unit.status = UnitStatus::Available;
        unit.reserved_for = None;
        unit.reserved_at = None;
        storage::set_unit(env, &unit);
    }

    request.units_reserved = request.units_reserved.saturating_sub(units.len());
    if request.units_reserved == 0 && request.units_issued == 0 {
        request.reserved_by = None;
    }
}

/// Undo a reservation. Units that are already AVAILABLE are skipped, so
/// repeating a release is harmless. Returns the number of units released.
pub fn release_reservation(
    env: &Env,
    request_id: u64,
    bank: Address,
    unit_ids: Vec<u64>,
) -> Result<u32, ContractError> {
    storage::get_organization(env, &bank)?;
    let mut request = storage::get_request(env, request_id)?;
    ensure_distinct(&unit_ids)?;

    let mut to_release: Vec<BloodUnit> = Vec::new(env);
    let mut released_ids: Vec<u64> = Vec::new(env);
    for unit_id in unit_ids.iter() {
        let unit = storage::get_unit(env, unit_id)?;
        if unit.owner != bank {
            return Err(ContractError::NotAuthorized);
        }
        match unit.status {
            UnitStatus::Available => continue,
            UnitStatus::Reserved if unit.reserved_for == Some(request_id) => {
                released_ids.push_back(unit_id);
                to_release.push_back(unit);
            }
            UnitStatus::Reserved => return Err(ContractError::UnitNotReserved),
            _ => return Err(ContractError::InvalidState),
        }
    }

    if to_release.is_empty() {
        return Ok(0);
    }

    release_units(env, &mut request, &to_release);
    storage::set_request(env, &request);

    events::emit_units_released(env, request_id, bank, released_ids);
    Ok(to_release.len())
}

/// Release every unit still RESERVED for the request. Used when the request
/// leaves the active states; the caller persists the request afterwards.
pub fn release_all_for_request(env: &Env, request: &mut BloodRequest) -> u32 {
    let mut to_release: Vec<BloodUnit> = Vec::new(env);
    let mut released_ids: Vec<u64> = Vec::new(env);
    for unit_id in storage::get_request_units(env, request.id).iter() {
        if let Ok(unit) = storage::get_unit(env, unit_id) {
            if unit.status == UnitStatus::Reserved && unit.reserved_for == Some(request.id) {
                released_ids.push_back(unit_id);
                to_release.push_back(unit);
            }
        }
    }

    // Counter must reflect the units actually held, even if it drifted
    request.units_reserved = to_release.len();

    if let Some(first) = to_release.first() {
        release_units(env, request, &to_release);
        events::emit_units_released(env, request.id, first.owner, released_ids);
    } else if request.units_issued == 0 {
        request.reserved_by = None;
    }

    to_release.len()
}

/// Hand reserved units over to the requester. Completes the request once the
/// issued count covers the need.
pub fn issue_units(
    env: &Env,
    request_id: u64,
    bank: Address,
    unit_ids: Vec<u64>,
) -> Result<(), ContractError> {
    storage::get_active_bank(env, &bank)?;
    let mut request = storage::get_request(env, request_id)?;
    ensure_request_accepts_units(&request)?;
    ensure_assigned_bank(&request, &bank)?;
    ensure_distinct(&unit_ids)?;

    let now = env.ledger().timestamp();
    let mut selected: Vec<BloodUnit> = Vec::new(env);
    for unit_id in unit_ids.iter() {
        let unit = storage::get_unit(env, unit_id)?;
        if unit.owner != bank {
            return Err(ContractError::NotAuthorized);
        }
        if unit.status != UnitStatus::Reserved || unit.reserved_for != Some(request_id) {
            return Err(ContractError::UnitNotReserved);
        }
        if unit.is_past_expiry(now) {
            return Err(ContractError::UnitExpired);
        }
        selected.push_back(unit);
    }

    for mut unit in selected.iter() {
        unit.status = UnitStatus::Issued;
        unit.issued_at = Some(now);
        storage::set_unit(env, &unit);
    }

    request.units_reserved = request.units_reserved.saturating_sub(selected.len());
    request.units_issued += selected.len();

    events::emit_units_issued(env, request_id, bank.clone(), unit_ids);

    if request.units_issued >= request.units_needed {
        request::complete_after_issue(env, &mut request, &bank);
    }
    storage::set_request(env, &request);
    Ok(())
}

/// Retire a unit whose expiry date has passed. A reserved unit is released
/// from its request first. Expiring an already EXPIRED unit does nothing.
pub fn expire_unit(env: &Env, unit_id: u64) -> Result<(), ContractError> {
    storage::get_config(env)?;
    let mut unit = storage::get_unit(env, unit_id)?;

    match unit.status {
        UnitStatus::Expired => return Ok(()),
        UnitStatus::Issued => return Err(ContractError::InvalidState),
        _ => {}
    }
    if !unit.is_past_expiry(env.ledger().timestamp()) {
        return Err(ContractError::UnitNotExpired);
    }

    if unit.status == UnitStatus::Reserved {
        if let Some(request_id) = unit.reserved_for {
            let mut request = storage::get_request(env, request_id)?;
            request.units_reserved = request.units_reserved.saturating_sub(1);
            if request.units_reserved == 0 && request.units_issued == 0 {
                request.reserved_by = None;
            }
            storage::set_request(env, &request);

            let mut released = Vec::new(env);
            released.push_back(unit_id);
            events::emit_units_released(env, request_id, unit.owner.clone(), released);
        }
    }

    let old_status = unit.status;
    unit.status = UnitStatus::Expired;
    unit.reserved_for = None;
    unit.reserved_at = None;
    storage::set_unit(env, &unit);

    events::emit_unit_status(env, unit_id, old_status, UnitStatus::Expired);
    Ok(())
}

/// Administrative removal of a unit that left the workflow for good
pub fn purge_unit(env: &Env, caller: &Address, unit_id: u64) -> Result<(), ContractError> {
    utils::require_admin(env, caller)?;
    let unit = storage::get_unit(env, unit_id)?;

    match unit.status {
        UnitStatus::Expired | UnitStatus::Issued => {}
        _ => return Err(ContractError::InvalidState),
    }

    storage::remove_unit(env, &unit);
    events::emit_unit_purged(env, unit_id, unit.status);
    Ok(())
}

/// Count of AVAILABLE, unexpired units of `bank` usable for a request of
/// `blood_group` and `component`, with the earliest expiry among them.
pub fn available_stock(
    env: &Env,
    bank: &Address,
    blood_group: BloodGroup,
    component: Component,
    now: u64,
) -> (u32, u64) {
    let mut count = 0u32;
    let mut earliest_expiry = u64::MAX;

    for unit_id in storage::get_org_units(env, bank).iter() {
        if let Ok(unit) = storage::get_unit(env, unit_id) {
            if unit.status != UnitStatus::Available
                || unit.is_past_expiry(now)
                || unit.component != component
                || !is_unit_compatible(unit.blood_group, blood_group, component)
            {
                continue;
            }
            count += 1;
            if unit.expiry_date < earliest_expiry {
                earliest_expiry = unit.expiry_date;
            }
        }
    }

    (count, earliest_expiry)
}

pub fn count_available_units(
    env: &Env,
    bank: Address,
    blood_group: BloodGroup,
    component: Component,
) -> Result<u32, ContractError> {
    storage::get_organization(env, &bank)?;
    let (count, _) = available_stock(env, &bank, blood_group, component, env.ledger().timestamp());
    Ok(count)
}
