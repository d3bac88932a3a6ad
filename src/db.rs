pub mod filters;

pub mod asset_repo;
pub use asset_repo::AssetRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod transfer_repo;
pub use transfer_repo::TransferRepository;
pub mod location_repo;
pub use location_repo::LocationRepository;
pub mod category_repo;
pub use category_repo::CategoryRepository;
