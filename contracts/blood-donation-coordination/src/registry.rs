// registry.rs - Organization and donor registration
// Hospitals and blood banks are onboarded by the admin; donors register themselves

use crate::compatibility::BloodGroup;
use crate::eligibility::{self, Gender};
use crate::events;
use crate::storage::{self, DonorProfile, Location, Organization, OrganizationKind};
use crate::utils;
use crate::ContractError;
use soroban_sdk::{Address, Env, String};

pub fn register_organization(
    env: &Env,
    caller: &Address,
    org: Address,
    name: String,
    kind: OrganizationKind,
    location: Location,
) -> Result<(), ContractError> {
    utils::require_admin(env, caller)?;
    utils::validate_text(&name, false)?;
    utils::validate_location(&location)?;

    if storage::has_organization(env, &org) {
        return Err(ContractError::AlreadyRegistered);
    }

    let organization = Organization {
        address: org.clone(),
        name,
        kind,
        location,
        is_active: true,
        registered_at: env.ledger().timestamp(),
    };
    storage::set_organization(env, &organization);

    if kind == OrganizationKind::BloodBank {
        storage::add_bank(env, &org);
    }

    events::emit_organization_changed(env, org, kind, true);
    Ok(())
}

pub fn deactivate_organization(
    env: &Env,
    caller: &Address,
    org: Address,
) -> Result<(), ContractError> {
    utils::require_admin(env, caller)?;

    let mut organization = storage::get_organization(env, &org)?;
    if !organization.is_active {
        return Err(ContractError::InvalidState);
    }

    organization.is_active = false;
    storage::set_organization(env, &organization);

    events::emit_organization_changed(env, org, organization.kind, false);
    Ok(())
}

pub fn register_donor(
    env: &Env,
    donor: Address,
    blood_group: BloodGroup,
    gender: Gender,
    last_donation: Option<u64>,
    location: Location,
) -> Result<(), ContractError> {
    storage::get_config(env)?;
    utils::validate_location(&location)?;

    if storage::has_donor(env, &donor) {
        return Err(ContractError::AlreadyRegistered);
    }

    let now = env.ledger().timestamp();
    if let Some(donated_at) = last_donation {
        if donated_at > now {
            return Err(ContractError::InvalidInput);
        }
    }

    let profile = DonorProfile {
        address: donor.clone(),
        blood_group,
        gender,
        last_donation,
        deferred_until: None,
        location,
        donation_count: 0,
        is_active: true,
        registered_at: now,
    };
    storage::set_donor(env, &profile);

    events::emit_donor_registered(env, donor, blood_group);
    Ok(())
}

/// A blood bank records a collected donation, restarting the donor's cooldown
pub fn record_donation(
    env: &Env,
    bank: Address,
    donor: Address,
    donated_at: u64,
) -> Result<(), ContractError> {
    storage::get_active_bank(env, &bank)?;
    let mut profile = storage::get_donor(env, &donor)?;

    if donated_at > env.ledger().timestamp() {
        return Err(ContractError::InvalidInput);
    }

    // Late entries never move the cooldown backwards
    let latest = match profile.last_donation {
        Some(previous) if previous > donated_at => previous,
        _ => donated_at,
    };
    profile.last_donation = Some(latest);
    profile.donation_count += 1;
    storage::set_donor(env, &profile);

    events::emit_donation_recorded(env, donor, bank, donated_at);
    Ok(())
}

pub fn set_donor_deferral(
    env: &Env,
    caller: &Address,
    donor: Address,
    deferred_until: Option<u64>,
) -> Result<(), ContractError> {
    utils::require_admin(env, caller)?;
    let mut profile = storage::get_donor(env, &donor)?;

    profile.deferred_until = deferred_until;
    storage::set_donor(env, &profile);

    events::emit_deferral_changed(env, donor, deferred_until);
    Ok(())
}

pub fn update_donor_location(
    env: &Env,
    donor: Address,
    location: Location,
) -> Result<(), ContractError> {
    utils::validate_location(&location)?;
    let mut profile = storage::get_donor(env, &donor)?;

    profile.location = location;
    storage::set_donor(env, &profile);
    Ok(())
}

pub fn is_donor_eligible(env: &Env, donor: &Address) -> Result<bool, ContractError> {
    let profile = storage::get_donor(env, donor)?;
    Ok(eligibility::is_eligible(&profile, env.ledger().timestamp()))
}

/// Next eligible date, pushed out by any deferral still in force
pub fn next_eligible_date(env: &Env, donor: &Address) -> Result<u64, ContractError> {
    let profile = storage::get_donor(env, donor)?;
    let cooldown_end = eligibility::next_eligible_date(profile.last_donation, profile.gender);
    Ok(match profile.deferred_until {
        Some(until) if until > cooldown_end => until,
        _ => cooldown_end,
    })
}
