//! # codeloop-error
//!
//! One error type for the whole workspace.
//!
//! An [`Error`] answers three questions: what failed ([`ErrorKind`]), whether
//! trying again could help ([`ErrorStatus`]), and where it happened
//! (`operation` plus key/value context). The underlying cause, if any, rides
//! along as an `anyhow::Error` source.
//!
//! ```rust
//! use codeloop_error::{Error, ErrorKind};
//!
//! fn launch() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ToolchainUnavailable, "gcc not found on PATH")
//!         .with_operation("sandbox::launch")
//!         .with_context("program", "gcc"))
//! }
//!
//! assert_eq!(launch().unwrap_err().kind(), ErrorKind::ToolchainUnavailable);
//! ```
//!
//! Foreign errors are wrapped with `set_source`. The only blanket `From` is
//! for `std::io::Error`, which maps onto the IO kinds.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using codeloop Error
pub type Result<T> = std::result::Result<T, Error>;
