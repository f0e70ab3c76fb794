// request.rs - Blood request lifecycle
// OPEN -> ASSIGNED -> FULFILLED, with CANCELLED and EXPIRED as the other terminal states

use crate::compatibility::{can_donate_red_cells, BloodGroup, Component};
use crate::eligibility;
use crate::events;
use crate::inventory;
use crate::storage::{
    self, Assignment, BloodRequest, DonorInterest, OrganizationKind, RequestStatus, Responder,
    Urgency,
};
use crate::utils;
use crate::ContractError;
use soroban_sdk::{Address, Env, String};

pub fn create_request(
    env: &Env,
    requester: Address,
    blood_group: BloodGroup,
    component: Component,
    units_needed: u32,
    urgency: Urgency,
    case_details: String,
    contact_info: String,
) -> Result<u64, ContractError> {
    let config = storage::get_config(env)?;
    let organization = storage::get_organization(env, &requester)?;
    if !organization.is_active {
        return Err(ContractError::NotAuthorized);
    }

    if units_needed == 0 || units_needed > config.max_units_per_request {
        return Err(ContractError::InvalidInput);
    }
    utils::validate_text(&case_details, true)?;
    utils::validate_text(&contact_info, false)?;

    let request_id = storage::next_request_id(env);
    let request = BloodRequest {
        id: request_id,
        requester: requester.clone(),
        blood_group,
        component,
        units_needed,
        urgency,
        status: RequestStatus::Open,
        assigned_to: Assignment::Unassigned,
        reserved_by: None,
        units_reserved: 0,
        units_issued: 0,
        created_at: env.ledger().timestamp(),
        assigned_at: None,
        fulfilled_at: None,
        cancelled_at: None,
        expired_at: None,
        cancel_reason: None,
        case_details,
        contact_info,
    };

    storage::set_request(env, &request);
    storage::add_org_request(env, &requester, request_id);
    storage::add_active_request(env, request_id);

    events::emit_request_created(
        env,
        request_id,
        requester,
        blood_group,
        component,
        units_needed,
        urgency,
    );
    Ok(request_id)
}

fn check_responder(
    env: &Env,
    request: &BloodRequest,
    responder: &Responder,
) -> Result<(), ContractError> {
    let now = env.ledger().timestamp();
    match responder {
        Responder::Donor(donor) => {
            let profile = storage::get_donor(env, donor)?;
            if !can_donate_red_cells(profile.blood_group, request.blood_group) {
                return Err(ContractError::IncompatibleBloodGroup);
            }
            if !eligibility::is_eligible(&profile, now) {
                return Err(ContractError::DonorNotEligible);
            }
        }
        Responder::Organization(org) => {
            if *org == request.requester {
                return Err(ContractError::SelfFulfillment);
            }
            let organization = storage::get_organization(env, org)?;
            if organization.kind != OrganizationKind::BloodBank || !organization.is_active {
                return Err(ContractError::NotAuthorized);
            }
            // Units already held or issued by another bank tie the request to that bank
            if let Some(holder) = &request.reserved_by {
                if holder != org {
                    return Err(ContractError::InvalidState);
                }
            }
            let (available, _) = inventory::available_stock(
                env,
                org,
                request.blood_group,
                request.component,
                now,
            );
            if available == 0 {
                return Err(ContractError::IncompatibleBloodGroup);
            }
        }
    }
    Ok(())
}

pub fn assign(
    env: &Env,
    request_id: u64,
    caller: &Address,
    responder: Responder,
) -> Result<(), ContractError> {
    let mut request = storage::get_request(env, request_id)?;
    if request.requester != *caller {
        return Err(ContractError::NotAuthorized);
    }
    if request.status != RequestStatus::Open {
        return Err(ContractError::InvalidState);
    }

    check_responder(env, &request, &responder)?;

    request.status = RequestStatus::Assigned;
    request.assigned_to = Assignment::To(responder.clone());
    request.assigned_at = Some(env.ledger().timestamp());
    storage::set_request(env, &request);

    events::emit_request_status(
        env,
        request_id,
        RequestStatus::Open,
        RequestStatus::Assigned,
        Assignment::To(responder),
        None,
    );
    Ok(())
}

fn mark_fulfilled(env: &Env, request: &mut BloodRequest) {
    let old_status = request.status;
    request.status = RequestStatus::Fulfilled;
    request.fulfilled_at = Some(env.ledger().timestamp());
    storage::remove_active_request(env, request.id);

    events::emit_request_status(
        env,
        request.id,
        old_status,
        RequestStatus::Fulfilled,
        request.assigned_to.clone(),
        None,
    );
}

pub fn fulfill(env: &Env, request_id: u64, caller: &Address) -> Result<(), ContractError> {
    let mut request = storage::get_request(env, request_id)?;
    if request.requester != *caller {
        return Err(ContractError::NotAuthorized);
    }
    if request.status != RequestStatus::Assigned {
        return Err(ContractError::InvalidState);
    }

    // Reservations that were never issued go back to their banks
    inventory::release_all_for_request(env, &mut request);
    mark_fulfilled(env, &mut request);
    storage::set_request(env, &request);
    Ok(())
}

/// Called once issued units cover the need. An OPEN request is first
/// assigned to the issuing bank so the assignment fields stay populated.
pub fn complete_after_issue(env: &Env, request: &mut BloodRequest, bank: &Address) {
    if request.status == RequestStatus::Open {
        let assignment = Assignment::To(Responder::Organization(bank.clone()));
        request.status = RequestStatus::Assigned;
        request.assigned_to = assignment.clone();
        request.assigned_at = Some(env.ledger().timestamp());

        events::emit_request_status(
            env,
            request.id,
            RequestStatus::Open,
            RequestStatus::Assigned,
            assignment,
            None,
        );
    }
    mark_fulfilled(env, request);
}

pub fn cancel(
    env: &Env,
    request_id: u64,
    caller: &Address,
    reason: String,
) -> Result<(), ContractError> {
    let config = storage::get_config(env)?;
    let mut request = storage::get_request(env, request_id)?;
    utils::validate_text(&reason, false)?;

    let is_responder = request.assigned_to.is_held_by(caller);
    if request.requester != *caller && config.admin != *caller && !is_responder {
        return Err(ContractError::NotAuthorized);
    }

    let old_status = request.status;
    if old_status != RequestStatus::Open && old_status != RequestStatus::Assigned {
        return Err(ContractError::InvalidState);
    }

    inventory::release_all_for_request(env, &mut request);

    // Assignment fields only survive on ASSIGNED and FULFILLED requests
    let responder = core::mem::replace(&mut request.assigned_to, Assignment::Unassigned);
    request.assigned_at = None;
    request.status = RequestStatus::Cancelled;
    request.cancelled_at = Some(env.ledger().timestamp());
    request.cancel_reason = Some(reason.clone());
    storage::set_request(env, &request);
    storage::remove_active_request(env, request_id);

    events::emit_request_status(
        env,
        request_id,
        old_status,
        RequestStatus::Cancelled,
        responder,
        Some(reason),
    );
    Ok(())
}

/// Deadline after which an OPEN request may be expired
pub fn expiry_deadline(env: &Env, request: &BloodRequest) -> Result<u64, ContractError> {
    let config = storage::get_config(env)?;
    Ok(request
        .created_at
        .saturating_add(config.expiry_window(request.urgency)))
}

pub fn is_overdue(env: &Env, request: &BloodRequest) -> Result<bool, ContractError> {
    Ok(request.status == RequestStatus::Open
        && env.ledger().timestamp() >= expiry_deadline(env, request)?)
}

/// Permissionless: anyone may expire an OPEN request past its urgency deadline
pub fn expire(env: &Env, request_id: u64) -> Result<(), ContractError> {
    let mut request = storage::get_request(env, request_id)?;
    if request.status != RequestStatus::Open {
        return Err(ContractError::InvalidState);
    }
    if !is_overdue(env, &request)? {
        return Err(ContractError::RequestNotExpired);
    }

    inventory::release_all_for_request(env, &mut request);

    request.status = RequestStatus::Expired;
    request.expired_at = Some(env.ledger().timestamp());
    storage::set_request(env, &request);
    storage::remove_active_request(env, request_id);

    events::emit_request_status(
        env,
        request_id,
        RequestStatus::Open,
        RequestStatus::Expired,
        Assignment::Unassigned,
        None,
    );
    Ok(())
}

pub fn express_interest(env: &Env, request_id: u64, donor: Address) -> Result<(), ContractError> {
    let request = storage::get_request(env, request_id)?;
    if request.status != RequestStatus::Open {
        return Err(ContractError::InvalidState);
    }

    let profile = storage::get_donor(env, &donor)?;
    if !profile.is_active {
        return Err(ContractError::NotAuthorized);
    }
    if storage::get_interest(env, request_id, &donor).is_some() {
        return Err(ContractError::DuplicateInterest);
    }

    let interest = DonorInterest {
        request_id,
        donor: donor.clone(),
        expressed_at: env.ledger().timestamp(),
    };
    storage::add_interest(env, &interest);

    events::emit_interest_expressed(env, request_id, donor);
    Ok(())
}

/// Donors may withdraw only while the request is still OPEN
pub fn withdraw_interest(env: &Env, request_id: u64, donor: Address) -> Result<(), ContractError> {
    let request = storage::get_request(env, request_id)?;
    if storage::get_interest(env, request_id, &donor).is_none() {
        return Err(ContractError::InterestNotFound);
    }
    if request.status != RequestStatus::Open {
        return Err(ContractError::InvalidState);
    }

    storage::remove_interest(env, request_id, &donor);

    events::emit_interest_withdrawn(env, request_id, donor);
    Ok(())
}
