//! Bookstore Checks - end-to-end checks for a demo account/bookstore REST API
//!
//! The suite authenticates once, then runs independent request/assert
//! scenarios against a fixed base URL. Scenarios are data: a table of
//! request definitions and expectations consumed by one generic runner.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod session;
pub mod suite;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::{Authenticator, BearerToken, SessionContext};
