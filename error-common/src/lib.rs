//! Common error handling for the clinic backend
//!
//! Every service in the workspace reports failures through [`ClinicError`],
//! a small, transport-independent taxonomy. The HTTP layer inspects only the
//! [`ErrorKind`] of an error to pick a status code and a machine-readable
//! [`codes`] value; the human-readable message travels alongside it and is
//! never parsed by clients.
//!
//! # Error Categories
//!
//! - **InvalidRequest**: malformed or missing input, including ownership mismatches
//! - **NotFound**: the referenced entity does not exist
//! - **Conflict**: unique-constraint violations (duplicate email or username)
//! - **Unauthorized**: missing, expired or invalid credentials or tokens
//! - **Internal**: storage, subprocess and rendering failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{ClinicError, ErrorKind};
//!
//! fn require_name(name: &str) -> error_common::Result<&str> {
//!     if name.trim().is_empty() {
//!         return Err(ClinicError::invalid_request("create patient", "first_name is required"));
//!     }
//!     Ok(name.trim())
//! }
//!
//! let err = require_name("  ").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidRequest);
//! assert_eq!(err.to_string(), "create patient: first_name is required");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
