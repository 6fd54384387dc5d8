pub mod claims;
pub(crate) mod health;

pub use health::health_check;
