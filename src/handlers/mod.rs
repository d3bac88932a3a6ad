pub mod inventory;
pub mod transfers;
