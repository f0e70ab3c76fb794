// matching.rs - Donor and blood bank matching for an open request
// Read-only: nothing in this module writes storage

use crate::compatibility::{can_donate_red_cells, BloodGroup};
use crate::eligibility;
use crate::inventory;
use crate::storage::{self, BloodRequest, Location, RequestStatus};
use crate::utils::location_distance;
use crate::ContractError;
use soroban_sdk::{contracttype, Address, Env, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorMatch {
    pub donor: Address,
    pub blood_group: BloodGroup,
    pub distance_km: Option<u32>,
    pub interested_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BankMatch {
    pub organization: Address,
    pub available_units: u32,
    pub can_fulfill: bool,
    pub distance_km: Option<u32>,
    pub earliest_expiry: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchResult {
    pub request_id: u64,
    pub donors: Vec<DonorMatch>,
    pub blood_banks: Vec<BankMatch>,
    pub evaluated_at: u64,
}

/// Known distances rank first, nearest first. Ties and unknown distances
/// fall back to `wins_tie`.
fn ranks_before(a_distance: Option<u32>, b_distance: Option<u32>, wins_tie: bool) -> bool {
    match (a_distance, b_distance) {
        (Some(a), Some(b)) if a != b => a < b,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        _ => wins_tie,
    }
}

/// Without a distance to tell them apart, the most recent interest ranks first
fn insert_donor(matches: &mut Vec<DonorMatch>, candidate: DonorMatch) {
    let mut position = matches.len();
    for (index, existing) in matches.iter().enumerate() {
        if ranks_before(
            candidate.distance_km,
            existing.distance_km,
            candidate.interested_at > existing.interested_at,
        ) {
            position = index as u32;
            break;
        }
    }
    matches.insert(position, candidate);
}

/// Without a distance to tell them apart, the bank whose stock expires soonest ranks first
fn insert_bank(matches: &mut Vec<BankMatch>, candidate: BankMatch) {
    let mut position = matches.len();
    for (index, existing) in matches.iter().enumerate() {
        if ranks_before(
            candidate.distance_km,
            existing.distance_km,
            candidate.earliest_expiry < existing.earliest_expiry,
        ) {
            position = index as u32;
            break;
        }
    }
    matches.insert(position, candidate);
}

/// Interested donors whose group can supply the request and who may donate now
pub fn find_donor_matches(
    env: &Env,
    request: &BloodRequest,
    origin: &Location,
    now: u64,
) -> Vec<DonorMatch> {
    let mut matches = Vec::new(env);

    for donor in storage::get_request_interests(env, request.id).iter() {
        let interest = match storage::get_interest(env, request.id, &donor) {
            Some(interest) => interest,
            None => continue,
        };
        let profile = match storage::get_donor(env, &donor) {
            Ok(profile) => profile,
            Err(_) => continue,
        };

        if !can_donate_red_cells(profile.blood_group, request.blood_group) {
            continue;
        }
        if !eligibility::is_eligible(&profile, now) {
            continue;
        }

        insert_donor(
            &mut matches,
            DonorMatch {
                donor,
                blood_group: profile.blood_group,
                distance_km: location_distance(origin, &profile.location),
                interested_at: interest.expressed_at,
            },
        );
    }

    matches
}

/// Active blood banks other than the requester holding usable stock
pub fn find_bank_matches(
    env: &Env,
    request: &BloodRequest,
    origin: &Location,
    now: u64,
) -> Vec<BankMatch> {
    let mut matches = Vec::new(env);

    for index in 0..storage::bank_count(env) {
        let bank = match storage::get_bank_by_index(env, index) {
            Some(bank) => bank,
            None => continue,
        };
        if bank == request.requester {
            continue;
        }
        let organization = match storage::get_organization(env, &bank) {
            Ok(organization) if organization.is_active => organization,
            _ => continue,
        };

        let (available_units, earliest_expiry) =
            inventory::available_stock(env, &bank, request.blood_group, request.component, now);
        if available_units == 0 {
            continue;
        }

        insert_bank(
            &mut matches,
            BankMatch {
                organization: bank,
                available_units,
                can_fulfill: available_units >= request.units_needed,
                distance_km: location_distance(origin, &organization.location),
                earliest_expiry,
            },
        );
    }

    matches
}

pub fn find_matches(env: &Env, request_id: u64) -> Result<MatchResult, ContractError> {
    let config = storage::get_config(env)?;
    let request = storage::get_request(env, request_id)?;
    if request.status != RequestStatus::Open {
        return Err(ContractError::InvalidState);
    }

    let now = env.ledger().timestamp();
    let mut result = MatchResult {
        request_id,
        donors: Vec::new(env),
        blood_banks: Vec::new(env),
        evaluated_at: now,
    };

    if !config.matching_enabled {
        return Ok(result);
    }

    let origin = match storage::get_organization(env, &request.requester) {
        Ok(organization) => organization.location,
        Err(_) => Location::Unknown,
    };

    let donors = find_donor_matches(env, &request, &origin, now);
    let banks = find_bank_matches(env, &request, &origin, now);

    let limit = config.max_match_results;
    result.donors = if donors.len() > limit {
        donors.slice(0..limit)
    } else {
        donors
    };
    result.blood_banks = if banks.len() > limit {
        banks.slice(0..limit)
    } else {
        banks
    };

    Ok(result)
}
