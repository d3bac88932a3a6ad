pub mod audit_service;
pub mod stock_service;
pub mod transfer_service;
pub mod validation_service;
