pub mod error;
pub mod logger;
pub mod rolling;
pub mod validation;
