pub mod asset;
pub mod audit;
pub mod category;
pub mod location;
pub mod stock;
pub mod transfer;
