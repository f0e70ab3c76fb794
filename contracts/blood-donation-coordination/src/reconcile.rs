// reconcile.rs - Idempotent maintenance jobs
// Repairs and sweeps go through the same transitions as user calls, never raw field writes

use crate::inventory;
use crate::request;
use crate::storage::{self, UnitStatus};
use crate::ContractError;
use soroban_sdk::{log, Address, Env};

/// Examine up to `limit` active requests, resuming where the previous sweep
/// stopped, and expire the overdue ones. Returns the number expired.
pub fn sweep_expired_requests(env: &Env, limit: u32) -> Result<u32, ContractError> {
    storage::get_config(env)?;

    let active = storage::get_active_requests(env);
    let total = active.len();
    if total == 0 || limit == 0 {
        return Ok(0);
    }

    let start = storage::get_request_sweep_cursor(env) % total;
    let scanned = limit.min(total);
    let next = (start + scanned) % total;

    let mut expired = 0u32;
    let mut removed_before_next = 0u32;
    for step in 0..scanned {
        let index = (start + step) % total;
        let request_id = match active.get(index) {
            Some(request_id) => request_id,
            None => continue,
        };
        let pending = storage::get_request(env, request_id)?;
        if request::is_overdue(env, &pending)? {
            request::expire(env, request_id)?;
            expired += 1;
            if index < next {
                removed_before_next += 1;
            }
        }
    }

    // Expired entries leave the list, shifting the resume point left
    let remaining = total - expired;
    let cursor = if remaining == 0 {
        0
    } else {
        (next - removed_before_next) % remaining
    };
    storage::set_request_sweep_cursor(env, cursor);

    log!(env, "request sweep scanned {}, expired {}", scanned, expired);
    Ok(expired)
}

/// Examine up to `limit` units of `bank`, resuming where the previous sweep
/// of that bank stopped, and expire those past their expiry date
pub fn sweep_expired_units(env: &Env, bank: Address, limit: u32) -> Result<u32, ContractError> {
    storage::get_config(env)?;
    storage::get_organization(env, &bank)?;

    let units = storage::get_org_units(env, &bank);
    let total = units.len();
    if total == 0 || limit == 0 {
        return Ok(0);
    }

    let now = env.ledger().timestamp();
    let start = storage::get_unit_sweep_cursor(env, &bank) % total;
    let scanned = limit.min(total);

    let mut expired = 0u32;
    for step in 0..scanned {
        let unit_id = match units.get((start + step) % total) {
            Some(unit_id) => unit_id,
            None => continue,
        };
        let unit = storage::get_unit(env, unit_id)?;
        if matches!(unit.status, UnitStatus::Expired | UnitStatus::Issued) {
            continue;
        }
        if unit.is_past_expiry(now) {
            inventory::expire_unit(env, unit_id)?;
            expired += 1;
        }
    }
    storage::set_unit_sweep_cursor(env, &bank, (start + scanned) % total);

    log!(env, "unit sweep scanned {}, expired {}", scanned, expired);
    Ok(expired)
}

/// Bring a request's reservation bookkeeping back in line with its units.
/// Terminal requests give back any unit still held for them; active requests
/// get `units_reserved` recomputed. Returns the number of units released.
pub fn reconcile_request(env: &Env, request_id: u64) -> Result<u32, ContractError> {
    storage::get_config(env)?;
    let mut request = storage::get_request(env, request_id)?;
    let before = request.clone();

    let mut released = 0u32;
    if request.status.is_terminal() {
        released = inventory::release_all_for_request(env, &mut request);
    } else {
        let mut held = 0u32;
        for unit_id in storage::get_request_units(env, request_id).iter() {
            if let Ok(unit) = storage::get_unit(env, unit_id) {
                if unit.status == UnitStatus::Reserved && unit.reserved_for == Some(request_id) {
                    held += 1;
                }
            }
        }
        request.units_reserved = held;
        if held == 0 && request.units_issued == 0 {
            request.reserved_by = None;
        }
    }

    if request != before {
        storage::set_request(env, &request);
        log!(env, "reconciled request {}, released {} units", request_id, released);
    }
    Ok(released)
}
