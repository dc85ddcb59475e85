#![allow(dead_code)]

pub mod composer;
pub mod footage;
pub mod host;
pub mod renderer;
pub mod store;
pub mod synthesizer;
pub mod writer;

use tube_pulse::ServiceError;

/// How a mock collaborator should fail
#[derive(Debug, Clone)]
pub enum Failure {
    Service(String),
    Quota(String),
}

impl Failure {
    /// Builds the error, using `service` for non-quota failures
    pub fn to_error(&self, service: fn(String) -> ServiceError) -> ServiceError {
        match self {
            Failure::Service(msg) => service(msg.clone()),
            Failure::Quota(msg) => ServiceError::QuotaExceeded(msg.clone()),
        }
    }
}
