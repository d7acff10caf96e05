//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service identifiers present and unique
//! - Bind addresses parse as socket addresses
//! - Validate value ranges (request timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Two services may share a bind address; the conflict surfaces at run time
//!   as a serve failure

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::SupervisorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,
    #[error("service #{0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate service id {0:?}")]
    DuplicateId(String),
    #[error("service {id:?} has invalid bind address {address:?}")]
    InvalidAddress { id: String, address: String },
    #[error("service {0:?} has a zero request timeout")]
    ZeroRequestTimeout(String),
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut seen = HashSet::new();
    for (index, service) in config.services.iter().enumerate() {
        if service.id.trim().is_empty() {
            errors.push(ValidationError::EmptyId(index));
        } else if !seen.insert(service.id.as_str()) {
            errors.push(ValidationError::DuplicateId(service.id.clone()));
        }

        if service.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                id: service.id.clone(),
                address: service.bind_address.clone(),
            });
        }

        if service.request_timeout_secs == 0 {
            errors.push(ValidationError::ZeroRequestTimeout(service.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
