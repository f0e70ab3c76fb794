#![cfg(test)]

use crate::storage::DAY;
use crate::tests::utils::{TestSetup, UNIT_SHELF_LIFE};
use crate::{
    Assignment, BloodGroup, Component, ContractError, RequestStatus, Responder, UnitStatus,
    Urgency,
};

#[test]
fn test_register_unit() {
    let setup = TestSetup::new();
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    let unit = setup.client.get_unit(&unit_id);
    assert_eq!(unit.owner, setup.bank);
    assert_eq!(unit.status, UnitStatus::Available);
    assert_eq!(unit.expiry_date, setup.now() + UNIT_SHELF_LIFE);
    assert_eq!(unit.reserved_for, None);
    assert!(setup
        .client
        .get_organization_units(&setup.bank)
        .contains(unit_id));
}

#[test]
fn test_register_unit_errors() {
    let setup = TestSetup::new();
    let now = setup.now();
    let barcode = setup.text("BC-DUPLICATE");

    setup.client.register_unit(
        &setup.bank,
        &barcode,
        &BloodGroup::OPos,
        &Component::Plasma,
        &(now - DAY),
        &(now + DAY),
        &UnitStatus::Available,
    );
    let result = setup.client.try_register_unit(
        &setup.far_bank,
        &barcode,
        &BloodGroup::OPos,
        &Component::Plasma,
        &(now - DAY),
        &(now + DAY),
        &UnitStatus::Available,
    );
    assert_eq!(result, Err(Ok(ContractError::DuplicateBarcode)));

    let result = setup.client.try_register_unit(
        &setup.bank,
        &setup.text("BC-OLD"),
        &BloodGroup::OPos,
        &Component::Plasma,
        &(now - 2 * DAY),
        &now,
        &UnitStatus::Available,
    );
    assert_eq!(result, Err(Ok(ContractError::UnitExpired)));

    let result = setup.client.try_register_unit(
        &setup.bank,
        &setup.text("BC-RESERVED"),
        &BloodGroup::OPos,
        &Component::Plasma,
        &(now - DAY),
        &(now + DAY),
        &UnitStatus::Reserved,
    );
    assert_eq!(result, Err(Ok(ContractError::InvalidInput)));

    let result = setup.client.try_register_unit(
        &setup.hospital,
        &setup.text("BC-HOSPITAL"),
        &BloodGroup::OPos,
        &Component::Plasma,
        &(now - DAY),
        &(now + DAY),
        &UnitStatus::Available,
    );
    assert_eq!(result, Err(Ok(ContractError::NotAuthorized)));
}

#[test]
fn test_lab_status_transitions() {
    let setup = TestSetup::new();
    let now = setup.now();
    let unit_id = setup.client.register_unit(
        &setup.bank,
        &setup.text("BC-LAB"),
        &BloodGroup::ANeg,
        &Component::Platelets,
        &(now - DAY),
        &(now + 5 * DAY),
        &UnitStatus::Tested,
    );
    let request_id = setup.create_request(BloodGroup::APos, Component::Platelets, 1, Urgency::High);

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::AlreadyReserved)));

    let result = setup
        .client
        .try_update_unit_status(&setup.bank, &unit_id, &UnitStatus::Issued);
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));

    let result = setup
        .client
        .try_update_unit_status(&setup.far_bank, &unit_id, &UnitStatus::Available);
    assert_eq!(result, Err(Ok(ContractError::NotAuthorized)));

    setup
        .client
        .update_unit_status(&setup.bank, &unit_id, &UnitStatus::Available);
    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Reserved);
}

#[test]
fn test_full_flow_two_units_fulfilled() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let units = setup.add_units(&setup.bank, BloodGroup::APos, Component::RedCells, 2);

    setup.client.reserve_units(&request_id, &setup.bank, &units);
    let request = setup.client.get_request(&request_id);
    assert_eq!(request.units_reserved, 2);
    assert_eq!(request.reserved_by, Some(setup.bank.clone()));
    for unit_id in units.iter() {
        let unit = setup.client.get_unit(&unit_id);
        assert_eq!(unit.status, UnitStatus::Reserved);
        assert_eq!(unit.reserved_for, Some(request_id));
    }

    setup.advance_ledger_time(1_800);
    setup.client.issue_units(&request_id, &setup.bank, &units);

    let request = setup.client.get_request(&request_id);
    assert_eq!(request.status, RequestStatus::Fulfilled);
    assert_eq!(request.units_issued, 2);
    assert_eq!(request.units_reserved, 0);
    assert_eq!(
        request.assigned_to,
        Assignment::To(Responder::Organization(setup.bank.clone()))
    );
    assert_eq!(request.fulfilled_at, Some(setup.now()));
    for unit_id in units.iter() {
        let unit = setup.client.get_unit(&unit_id);
        assert_eq!(unit.status, UnitStatus::Issued);
        assert_eq!(unit.issued_at, Some(setup.now()));
    }
    assert_eq!(setup.client.get_request_units(&request_id).len(), 2);
}

#[test]
fn test_partial_issue_keeps_request_open() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::BNeg, Component::RedCells, 2, Urgency::Medium);
    let units = setup.add_units(&setup.bank, BloodGroup::ONeg, Component::RedCells, 2);

    setup.client.reserve_units(&request_id, &setup.bank, &units);
    setup
        .client
        .issue_units(&request_id, &setup.bank, &setup.ids(&[units.get(0).unwrap()]));

    let request = setup.client.get_request(&request_id);
    assert_eq!(request.status, RequestStatus::Open);
    assert_eq!(request.units_issued, 1);
    assert_eq!(request.units_reserved, 1);
}

#[test]
fn test_over_reservation_fails() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let units = setup.add_units(&setup.bank, BloodGroup::APos, Component::RedCells, 3);

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &units);
    assert_eq!(result, Err(Ok(ContractError::InsufficientUnits)));

    let first_two = setup.ids(&[units.get(0).unwrap(), units.get(1).unwrap()]);
    setup
        .client
        .reserve_units(&request_id, &setup.bank, &first_two);

    let result = setup.client.try_reserve_units(
        &request_id,
        &setup.bank,
        &setup.ids(&[units.get(2).unwrap()]),
    );
    assert_eq!(result, Err(Ok(ContractError::InsufficientUnits)));
    assert_eq!(
        setup.client.get_unit(&units.get(2).unwrap()).status,
        UnitStatus::Available
    );
}

#[test]
fn test_unit_cannot_be_reserved_twice() {
    let setup = TestSetup::new();
    let first = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let second = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    setup
        .client
        .reserve_units(&first, &setup.bank, &setup.ids(&[unit_id]));
    let result = setup
        .client
        .try_reserve_units(&second, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::AlreadyReserved)));

    assert_eq!(setup.client.get_unit(&unit_id).reserved_for, Some(first));
    assert_eq!(setup.client.get_request(&second).units_reserved, 0);
}

#[test]
fn test_reserving_held_unit_again_reports_already_reserved() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::AlreadyReserved)));
    assert_eq!(setup.client.get_request(&request_id).units_reserved, 1);

    // A fresh unit still runs into the exhausted need
    let extra = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);
    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[extra]));
    assert_eq!(result, Err(Ok(ContractError::InsufficientUnits)));
}

#[test]
fn test_failed_reservation_changes_nothing() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let good = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);
    let bad = setup.add_unit(&setup.bank, BloodGroup::BPos, Component::RedCells);

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[good, bad]));
    assert_eq!(result, Err(Ok(ContractError::IncompatibleBloodGroup)));

    assert_eq!(setup.client.get_unit(&good).status, UnitStatus::Available);
    let request = setup.client.get_request(&request_id);
    assert_eq!(request.units_reserved, 0);
    assert_eq!(request.reserved_by, None);
}

#[test]
fn test_reservation_checks() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let plasma = setup.add_unit(&setup.bank, BloodGroup::APos, Component::Plasma);
    let foreign = setup.add_unit(&setup.far_bank, BloodGroup::APos, Component::RedCells);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[plasma]));
    assert_eq!(result, Err(Ok(ContractError::ComponentMismatch)));

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[foreign]));
    assert_eq!(result, Err(Ok(ContractError::NotAuthorized)));

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id, unit_id]));
    assert_eq!(result, Err(Ok(ContractError::InvalidInput)));

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[]));
    assert_eq!(result, Err(Ok(ContractError::InvalidInput)));

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[404]));
    assert_eq!(result, Err(Ok(ContractError::UnitNotFound)));
}

#[test]
fn test_plasma_reservation_uses_plasma_rule() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::ONeg, Component::Plasma, 1, Urgency::High);
    let ab_plasma = setup.add_unit(&setup.bank, BloodGroup::ABPos, Component::Plasma);

    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[ab_plasma]));
    assert_eq!(setup.client.get_request(&request_id).units_reserved, 1);
}

#[test]
fn test_single_bank_holds_reservation() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let near = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);
    let far = setup.add_unit(&setup.far_bank, BloodGroup::APos, Component::RedCells);

    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[near]));
    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.far_bank, &setup.ids(&[far]));
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));

    setup
        .client
        .release_reservation(&request_id, &setup.bank, &setup.ids(&[near]));
    setup
        .client
        .reserve_units(&request_id, &setup.far_bank, &setup.ids(&[far]));
    assert_eq!(
        setup.client.get_request(&request_id).reserved_by,
        Some(setup.far_bank.clone())
    );
}

#[test]
fn test_only_assigned_bank_moves_units() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let near = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);
    let far = setup.add_unit(&setup.far_bank, BloodGroup::APos, Component::RedCells);

    setup.client.assign(
        &request_id,
        &setup.hospital,
        &Responder::Organization(setup.far_bank.clone()),
    );
    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[near]));
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));
    assert_eq!(setup.client.get_unit(&near).status, UnitStatus::Available);

    setup
        .client
        .reserve_units(&request_id, &setup.far_bank, &setup.ids(&[far]));
    setup
        .client
        .issue_units(&request_id, &setup.far_bank, &setup.ids(&[far]));
    let request = setup.client.get_request(&request_id);
    assert_eq!(request.status, RequestStatus::Fulfilled);
    assert_eq!(
        request.assigned_to,
        Assignment::To(Responder::Organization(setup.far_bank.clone()))
    );
}

#[test]
fn test_bank_cannot_issue_once_donor_assigned() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    setup.client.assign(
        &request_id,
        &setup.hospital,
        &Responder::Donor(setup.donor_o_neg.clone()),
    );

    let result = setup
        .client
        .try_issue_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));
    assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Reserved);
    assert_eq!(setup.client.get_request(&request_id).units_issued, 0);
}

#[test]
fn test_bank_cannot_reserve_for_own_request() {
    let setup = TestSetup::new();
    let request_id = setup.client.create_request(
        &setup.bank,
        &BloodGroup::APos,
        &Component::RedCells,
        &1,
        &Urgency::Low,
        &setup.text(""),
        &setup.text("Bank desk"),
    );
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::SelfFulfillment)));
}

#[test]
fn test_release_is_idempotent() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let units = setup.add_units(&setup.bank, BloodGroup::APos, Component::RedCells, 2);
    setup.client.reserve_units(&request_id, &setup.bank, &units);

    let released = setup
        .client
        .release_reservation(&request_id, &setup.bank, &units);
    assert_eq!(released, 2);

    let released = setup
        .client
        .release_reservation(&request_id, &setup.bank, &units);
    assert_eq!(released, 0);

    let request = setup.client.get_request(&request_id);
    assert_eq!(request.units_reserved, 0);
    assert_eq!(request.reserved_by, None);
    for unit_id in units.iter() {
        let unit = setup.client.get_unit(&unit_id);
        assert_eq!(unit.status, UnitStatus::Available);
        assert_eq!(unit.reserved_for, None);
    }
}

#[test]
fn test_release_rejects_units_of_other_requests() {
    let setup = TestSetup::new();
    let first = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let second = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);
    setup
        .client
        .reserve_units(&first, &setup.bank, &setup.ids(&[unit_id]));

    let result = setup
        .client
        .try_release_reservation(&second, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::UnitNotReserved)));
    assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Reserved);
}

#[test]
fn test_issue_requires_reservation() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::High);
    let unit_id = setup.add_unit(&setup.bank, BloodGroup::APos, Component::RedCells);

    let result = setup
        .client
        .try_issue_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::UnitNotReserved)));
    assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Available);
}

#[test]
fn test_cancel_returns_reserved_units() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let units = setup.add_units(&setup.bank, BloodGroup::OPos, Component::RedCells, 2);
    setup.client.reserve_units(&request_id, &setup.bank, &units);

    setup
        .client
        .cancel(&request_id, &setup.hospital, &setup.text("Surgery postponed"));

    let request = setup.client.get_request(&request_id);
    assert_eq!(request.status, RequestStatus::Cancelled);
    assert_eq!(request.units_reserved, 0);
    assert_eq!(request.reserved_by, None);
    for unit_id in units.iter() {
        assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Available);
    }

    let result = setup
        .client
        .try_reserve_units(&request_id, &setup.bank, &units);
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));
}

#[test]
fn test_fulfill_returns_unissued_units() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 2, Urgency::High);
    let units = setup.add_units(&setup.bank, BloodGroup::APos, Component::RedCells, 2);
    setup.client.reserve_units(&request_id, &setup.bank, &units);
    setup.client.assign(
        &request_id,
        &setup.hospital,
        &Responder::Donor(setup.donor_a_pos.clone()),
    );

    setup.client.fulfill(&request_id, &setup.hospital);

    assert_eq!(
        setup.client.get_request(&request_id).status,
        RequestStatus::Fulfilled
    );
    for unit_id in units.iter() {
        assert_eq!(setup.client.get_unit(&unit_id).status, UnitStatus::Available);
    }
}

#[test]
fn test_expire_reserved_unit() {
    let setup = TestSetup::new();
    let request_id = setup.create_request(BloodGroup::APos, Component::RedCells, 1, Urgency::Low);
    let unit_id = setup.add_unit_expiring(
        &setup.bank,
        BloodGroup::APos,
        Component::RedCells,
        setup.now() + DAY,
    );
    setup
        .client
        .reserve_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));

    let result = setup.client.try_expire_unit(&unit_id);
    assert_eq!(result, Err(Ok(ContractError::UnitNotExpired)));

    setup.advance_ledger_time(DAY);
    let result = setup
        .client
        .try_issue_units(&request_id, &setup.bank, &setup.ids(&[unit_id]));
    assert_eq!(result, Err(Ok(ContractError::UnitExpired)));

    setup.client.expire_unit(&unit_id);
    let unit = setup.client.get_unit(&unit_id);
    assert_eq!(unit.status, UnitStatus::Expired);
    assert_eq!(unit.reserved_for, None);

    let request = setup.client.get_request(&request_id);
    assert_eq!(request.units_reserved, 0);
    assert_eq!(request.reserved_by, None);

    // Already expired is a no-op
    setup.client.expire_unit(&unit_id);
}

#[test]
fn test_purge_unit() {
    let setup = TestSetup::new();
    let unit_id = setup.add_unit_expiring(
        &setup.bank,
        BloodGroup::OPos,
        Component::WholeBlood,
        setup.now() + DAY,
    );

    let result = setup.client.try_purge_unit(&setup.admin, &unit_id);
    assert_eq!(result, Err(Ok(ContractError::InvalidState)));

    setup.advance_ledger_time(DAY);
    setup.client.expire_unit(&unit_id);

    let result = setup.client.try_purge_unit(&setup.bank, &unit_id);
    assert_eq!(result, Err(Ok(ContractError::NotAuthorized)));

    setup.client.purge_unit(&setup.admin, &unit_id);
    let result = setup.client.try_get_unit(&unit_id);
    assert_eq!(result, Err(Ok(ContractError::UnitNotFound)));
    assert!(!setup
        .client
        .get_organization_units(&setup.bank)
        .contains(unit_id));
}

#[test]
fn test_count_available_units() {
    let setup = TestSetup::new();
    setup.add_units(&setup.bank, BloodGroup::ONeg, Component::RedCells, 2);
    setup.add_units(&setup.bank, BloodGroup::APos, Component::RedCells, 3);
    setup.add_units(&setup.bank, BloodGroup::APos, Component::Plasma, 1);

    let count = setup.client.count_available_units(
        &setup.bank,
        &BloodGroup::ANeg,
        &Component::RedCells,
    );
    assert_eq!(count, 2);

    let count = setup.client.count_available_units(
        &setup.bank,
        &BloodGroup::ABPos,
        &Component::RedCells,
    );
    assert_eq!(count, 5);

    // A plasma suits an O recipient but not an AB one
    let count =
        setup
            .client
            .count_available_units(&setup.bank, &BloodGroup::OPos, &Component::Plasma);
    assert_eq!(count, 1);

    let count =
        setup
            .client
            .count_available_units(&setup.bank, &BloodGroup::ABPos, &Component::Plasma);
    assert_eq!(count, 0);
}
