// compatibility.rs - ABO/Rh compatibility tables
// Red cell donation tables in both directions plus the reversed ABO rule for plasma products

use crate::ContractError;
use soroban_sdk::{contracttype, Env, String, Vec};

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BloodGroup {
    APos,
    ANeg,
    BPos,
    BNeg,
    ABPos,
    ABNeg,
    OPos,
    ONeg,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Component {
    WholeBlood,
    RedCells,
    Plasma,
    Platelets,
    Cryoprecipitate,
}

/// Groups that can receive red cells from `donor`
pub fn red_cell_recipients(donor: BloodGroup) -> &'static [BloodGroup] {
    use BloodGroup::*;
    match donor {
        ONeg => &[ONeg, OPos, ANeg, APos, BNeg, BPos, ABNeg, ABPos],
        OPos => &[OPos, APos, BPos, ABPos],
        ANeg => &[ANeg, APos, ABNeg, ABPos],
        APos => &[APos, ABPos],
        BNeg => &[BNeg, BPos, ABNeg, ABPos],
        BPos => &[BPos, ABPos],
        ABNeg => &[ABNeg, ABPos],
        ABPos => &[ABPos],
    }
}

/// Groups whose red cells `recipient` can accept
pub fn red_cell_donors(recipient: BloodGroup) -> &'static [BloodGroup] {
    use BloodGroup::*;
    match recipient {
        ONeg => &[ONeg],
        OPos => &[ONeg, OPos],
        ANeg => &[ONeg, ANeg],
        APos => &[ONeg, OPos, ANeg, APos],
        BNeg => &[ONeg, BNeg],
        BPos => &[ONeg, OPos, BNeg, BPos],
        ABNeg => &[ONeg, ANeg, BNeg, ABNeg],
        ABPos => &[ONeg, OPos, ANeg, APos, BNeg, BPos, ABNeg, ABPos],
    }
}

pub fn can_donate_red_cells(donor: BloodGroup, recipient: BloodGroup) -> bool {
    red_cell_recipients(donor).contains(&recipient)
}

/// Bit set of ABO antigens carried on the red cells (A = 1, B = 2)
fn abo_antigens(group: BloodGroup) -> u8 {
    match group {
        BloodGroup::APos | BloodGroup::ANeg => 0b01,
        BloodGroup::BPos | BloodGroup::BNeg => 0b10,
        BloodGroup::ABPos | BloodGroup::ABNeg => 0b11,
        BloodGroup::OPos | BloodGroup::ONeg => 0b00,
    }
}

/// Plasma carries antibodies against every ABO antigen the donor lacks, so the
/// recipient's antigens must be a subset of the donor's. Rh does not apply.
pub fn can_donate_plasma(donor: BloodGroup, recipient: BloodGroup) -> bool {
    (abo_antigens(recipient) & !abo_antigens(donor)) == 0
}

/// Whether a unit of `unit_group` may be issued against a request for `request_group`
pub fn is_unit_compatible(
    unit_group: BloodGroup,
    request_group: BloodGroup,
    component: Component,
) -> bool {
    match component {
        Component::WholeBlood | Component::RedCells | Component::Platelets => {
            can_donate_red_cells(unit_group, request_group)
        }
        Component::Plasma | Component::Cryoprecipitate => {
            can_donate_plasma(unit_group, request_group)
        }
    }
}

pub fn compatible_recipients(env: &Env, donor: BloodGroup) -> Vec<BloodGroup> {
    let mut groups = Vec::new(env);
    for group in red_cell_recipients(donor) {
        groups.push_back(*group);
    }
    groups
}

pub fn compatible_donors(env: &Env, recipient: BloodGroup) -> Vec<BloodGroup> {
    let mut groups = Vec::new(env);
    for group in red_cell_donors(recipient) {
        groups.push_back(*group);
    }
    groups
}

/// Parse one of the eight textual codes ("A+", "AB-", "O+", ...)
pub fn parse_blood_group(code: &String) -> Result<BloodGroup, ContractError> {
    let len = code.len() as usize;
    if len < 2 || len > 3 {
        return Err(ContractError::InvalidBloodGroup);
    }

    let mut buf = [0u8; 3];
    code.copy_into_slice(&mut buf[..len]);

    match &buf[..len] {
        b"A+" => Ok(BloodGroup::APos),
        b"A-" => Ok(BloodGroup::ANeg),
        b"B+" => Ok(BloodGroup::BPos),
        b"B-" => Ok(BloodGroup::BNeg),
        b"AB+" => Ok(BloodGroup::ABPos),
        b"AB-" => Ok(BloodGroup::ABNeg),
        b"O+" => Ok(BloodGroup::OPos),
        b"O-" => Ok(BloodGroup::ONeg),
        _ => Err(ContractError::InvalidBloodGroup),
    }
}

/// Convert blood group to its textual code for reporting
pub fn blood_group_code(env: &Env, group: BloodGroup) -> String {
    let code = match group {
        BloodGroup::APos => "A+",
        BloodGroup::ANeg => "A-",
        BloodGroup::BPos => "B+",
        BloodGroup::BNeg => "B-",
        BloodGroup::ABPos => "AB+",
        BloodGroup::ABNeg => "AB-",
        BloodGroup::OPos => "O+",
        BloodGroup::ONeg => "O-",
    };
    String::from_str(env, code)
}
