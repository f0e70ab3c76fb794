// utils.rs - Shared helpers
// Admin checks, coordinate validation and integer distance estimation

use crate::storage::{self, Config, GeoPoint, Location};
use crate::ContractError;
use soroban_sdk::{Address, Env, String};

const MICRO: i128 = 1_000_000;
const MAX_LAT: i64 = 90_000_000;
const MAX_LON: i64 = 180_000_000;
const METERS_PER_DEGREE: i128 = 111_320;
pub const MAX_TEXT_LEN: u32 = 512;

/// Load the config and make sure `caller` is its admin
pub fn require_admin(env: &Env, caller: &Address) -> Result<Config, ContractError> {
    let config = storage::get_config(env)?;
    if *caller != config.admin {
        return Err(ContractError::NotAuthorized);
    }
    Ok(config)
}

pub fn validate_location(location: &Location) -> Result<(), ContractError> {
    if let Location::At(point) = location {
        if point.lat < -MAX_LAT || point.lat > MAX_LAT || point.lon < -MAX_LON || point.lon > MAX_LON
        {
            return Err(ContractError::InvalidLocation);
        }
    }
    Ok(())
}

pub fn validate_text(text: &String, allow_empty: bool) -> Result<(), ContractError> {
    if (!allow_empty && text.is_empty()) || text.len() > MAX_TEXT_LEN {
        return Err(ContractError::InvalidInput);
    }
    Ok(())
}

/// Bhaskara I approximation of cos(x) for x in whole degrees, |x| <= 90.
/// Returned as (numerator, denominator).
fn cos_degrees(x: i128) -> (i128, i128) {
    let x = x.abs().min(90);
    (32_400 - 4 * x * x, 32_400 + x * x)
}

fn isqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// Equirectangular distance estimate in whole kilometres
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> u32 {
    let dlat = (a.lat as i128 - b.lat as i128).abs();
    let mut dlon = (a.lon as i128 - b.lon as i128).abs();
    if dlon > MAX_LON as i128 {
        dlon = 2 * MAX_LON as i128 - dlon;
    }

    let mean_lat_degrees = (a.lat as i128 + b.lat as i128) / 2 / MICRO;
    let (cos_num, cos_den) = cos_degrees(mean_lat_degrees);

    let dy = dlat * METERS_PER_DEGREE / MICRO;
    let dx = dlon * METERS_PER_DEGREE * cos_num / cos_den / MICRO;

    let meters = isqrt((dx * dx + dy * dy) as u128);
    (meters / 1_000).min(u32::MAX as u128) as u32
}

/// Distance between two locations; unknown when either side is unknown
pub fn location_distance(a: &Location, b: &Location) -> Option<u32> {
    match (a, b) {
        (Location::At(a), Location::At(b)) => Some(distance_km(a, b)),
        _ => None,
    }
}
