//! # VectorCloud Event Errors
//!
//! Errors raised while decoding inbound channel payloads.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("Invalid '{event_name}' payload: {details}")]
    InvalidEventData {
        event_name: String,
        details: String,
    },
}
