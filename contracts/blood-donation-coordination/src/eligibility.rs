// eligibility.rs - Donor eligibility rules
// Gender dependent cooldown after the last whole blood donation plus medical deferrals

use crate::storage::DonorProfile;
use soroban_sdk::contracttype;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const MALE_COOLDOWN_DAYS: u64 = 56;
pub const DEFAULT_COOLDOWN_DAYS: u64 = 84;

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

pub fn cooldown_seconds(gender: Gender) -> u64 {
    let days = match gender {
        Gender::Male => MALE_COOLDOWN_DAYS,
        Gender::Female | Gender::Other => DEFAULT_COOLDOWN_DAYS,
    };
    days * SECONDS_PER_DAY
}

/// Earliest timestamp at which the donor may donate again.
/// A donor who never donated is eligible from timestamp 0.
pub fn next_eligible_date(last_donation: Option<u64>, gender: Gender) -> u64 {
    match last_donation {
        Some(donated_at) => donated_at.saturating_add(cooldown_seconds(gender)),
        None => 0,
    }
}

pub fn is_deferred(donor: &DonorProfile, now: u64) -> bool {
    match donor.deferred_until {
        Some(until) => now < until,
        None => false,
    }
}

pub fn is_eligible(donor: &DonorProfile, now: u64) -> bool {
    donor.is_active
        && now >= next_eligible_date(donor.last_donation, donor.gender)
        && !is_deferred(donor, now)
}
