pub mod audit_log;
pub mod rotator;

/// Header carrying the rotating credential on internal API calls.
pub const TOKEN_HEADER: &str = "X-Relay-Token";

pub use audit_log::AuditLogger;
pub use rotator::{CredentialError, CredentialRotator, RotatingCredential};
