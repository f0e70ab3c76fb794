#![cfg(test)]

extern crate std;

use crate::storage::DAY;
use crate::{
    BloodDonationCoordination, BloodDonationCoordinationClient, BloodGroup, Component, Gender,
    GeoPoint, Location, OrganizationKind, UnitStatus, Urgency,
};
use core::cell::Cell;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    Address, Env, String, Vec,
};

pub const START_TIME: u64 = 1_700_000_000;
pub const UNIT_SHELF_LIFE: u64 = 35 * DAY;

pub fn point(lat_micro: i64, lon_micro: i64) -> Location {
    Location::At(GeoPoint {
        lat: lat_micro,
        lon: lon_micro,
    })
}

pub struct TestSetup {
    pub env: Env,
    pub client: BloodDonationCoordinationClient<'static>,
    pub admin: Address,
    pub hospital: Address,
    /// Blood bank about 11 km from the hospital
    pub bank: Address,
    /// Blood bank about 111 km from the hospital
    pub far_bank: Address,
    /// A+ donor about 5 km from the hospital
    pub donor_a_pos: Address,
    /// O- donor about 55 km from the hospital
    pub donor_o_neg: Address,
    /// B+ donor without a known location
    pub donor_b_pos: Address,
    next_barcode: Cell<u32>,
}

impl TestSetup {
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_timestamp(START_TIME);

        let contract_id = env.register(BloodDonationCoordination, ());
        let client = BloodDonationCoordinationClient::new(&env, &contract_id);

        let admin = Address::generate(&env);
        let hospital = Address::generate(&env);
        let bank = Address::generate(&env);
        let far_bank = Address::generate(&env);
        let donor_a_pos = Address::generate(&env);
        let donor_o_neg = Address::generate(&env);
        let donor_b_pos = Address::generate(&env);

        client.initialize(&admin);

        client.register_organization(
            &admin,
            &hospital,
            &String::from_str(&env, "City General Hospital"),
            &OrganizationKind::Hospital,
            &point(40_000_000, -74_000_000),
        );
        client.register_organization(
            &admin,
            &bank,
            &String::from_str(&env, "Downtown Blood Bank"),
            &OrganizationKind::BloodBank,
            &point(40_100_000, -74_000_000),
        );
        client.register_organization(
            &admin,
            &far_bank,
            &String::from_str(&env, "Upstate Blood Bank"),
            &OrganizationKind::BloodBank,
            &point(41_000_000, -74_000_000),
        );

        client.register_donor(
            &donor_a_pos,
            &BloodGroup::APos,
            &Gender::Female,
            &None,
            &point(40_050_000, -74_000_000),
        );
        client.register_donor(
            &donor_o_neg,
            &BloodGroup::ONeg,
            &Gender::Male,
            &None,
            &point(40_500_000, -74_000_000),
        );
        client.register_donor(
            &donor_b_pos,
            &BloodGroup::BPos,
            &Gender::Other,
            &None,
            &Location::Unknown,
        );

        Self {
            env,
            client,
            admin,
            hospital,
            bank,
            far_bank,
            donor_a_pos,
            donor_o_neg,
            donor_b_pos,
            next_barcode: Cell::new(1),
        }
    }

    pub fn now(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    pub fn advance_ledger_time(&self, seconds: u64) {
        self.env.ledger().set_timestamp(self.now() + seconds);
    }

    pub fn text(&self, value: &str) -> String {
        String::from_str(&self.env, value)
    }

    pub fn ids(&self, values: &[u64]) -> Vec<u64> {
        let mut ids = Vec::new(&self.env);
        for value in values {
            ids.push_back(*value);
        }
        ids
    }

    fn barcode(&self) -> String {
        let number = self.next_barcode.get();
        self.next_barcode.set(number + 1);
        String::from_str(&self.env, &std::format!("BC-{:06}", number))
    }

    pub fn create_request(
        &self,
        blood_group: BloodGroup,
        component: Component,
        units_needed: u32,
        urgency: Urgency,
    ) -> u64 {
        self.client.create_request(
            &self.hospital,
            &blood_group,
            &component,
            &units_needed,
            &urgency,
            &self.text("Trauma patient, theatre 3"),
            &self.text("Ward 5 desk, ext 4412"),
        )
    }

    /// Register one AVAILABLE unit at `bank` expiring `UNIT_SHELF_LIFE` from now
    pub fn add_unit(&self, bank: &Address, blood_group: BloodGroup, component: Component) -> u64 {
        self.add_unit_expiring(bank, blood_group, component, self.now() + UNIT_SHELF_LIFE)
    }

    pub fn add_unit_expiring(
        &self,
        bank: &Address,
        blood_group: BloodGroup,
        component: Component,
        expiry_date: u64,
    ) -> u64 {
        self.client.register_unit(
            bank,
            &self.barcode(),
            &blood_group,
            &component,
            &(self.now() - DAY),
            &expiry_date,
            &UnitStatus::Available,
        )
    }

    pub fn add_units(
        &self,
        bank: &Address,
        blood_group: BloodGroup,
        component: Component,
        count: u32,
    ) -> Vec<u64> {
        let mut ids = Vec::new(&self.env);
        for _ in 0..count {
            ids.push_back(self.add_unit(bank, blood_group, component));
        }
        ids
    }
}
