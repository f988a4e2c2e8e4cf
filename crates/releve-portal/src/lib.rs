//! Portal access for statement retrieval.
//!
//! This crate owns the two I/O concerns around the reconstruction engine:
//! downloading one client's detailed statement PDF from the portal export
//! API, and running those downloads for many clients under a bounded
//! worker pool with per-client retries and an overall wall-clock budget.
//!
//! Authentication stays out of scope: the caller provides a valid session
//! cookie; an expired session surfaces as [`PortalError::SessionExpired`].

pub mod batch;
pub mod client;
pub mod error;

pub use batch::{FetchOptions, FetchOutcome, fetch_statements};
pub use client::PortalClient;
pub use error::PortalError;
