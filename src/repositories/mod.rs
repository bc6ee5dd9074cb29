pub mod company_repository;
pub mod currency_repository;
pub mod stock_repository;
pub mod user_repository;

pub use company_repository::*;
pub use currency_repository::*;
pub use stock_repository::*;
pub use user_repository::*;
