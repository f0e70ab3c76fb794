mod inventory;
pub mod utils;
