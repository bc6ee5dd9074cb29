pub mod company;
pub mod currency;
pub mod stock;
pub mod user;

pub use company::*;
pub use currency::*;
pub use stock::*;
pub use user::*;
