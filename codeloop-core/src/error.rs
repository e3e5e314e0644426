//! Codeloop error types
//!
//! Re-exports codeloop-error so downstream crates need a single dependency.

pub use codeloop_error::{Error, ErrorKind, ErrorStatus, Result};
