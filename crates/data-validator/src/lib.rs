//! Data Validation
//!
//! Provides the request precondition and value checks applied to water
//! samples before they reach the risk engine.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
