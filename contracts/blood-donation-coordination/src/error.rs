use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Authorization errors
    NotAuthorized = 3,

    // Validation errors
    InvalidInput = 4,
    InvalidBloodGroup = 5,
    InvalidLocation = 6,

    // Lookup errors
    RequestNotFound = 7,
    UnitNotFound = 8,
    DonorNotFound = 9,
    OrganizationNotFound = 10,
    InterestNotFound = 11,

    // Registration errors
    AlreadyRegistered = 12,
    DuplicateBarcode = 13,
    DuplicateInterest = 14,

    // State machine errors
    InvalidState = 15,
    IncompatibleBloodGroup = 16,
    ComponentMismatch = 17,
    DonorNotEligible = 18,
    RequestNotExpired = 19,
    SelfFulfillment = 20,

    // Inventory errors
    InsufficientUnits = 21,
    AlreadyReserved = 22,
    UnitNotReserved = 23,
    UnitExpired = 24,
    UnitNotExpired = 25,
}
