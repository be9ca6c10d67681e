//! REST API client module for the HerbalDoc doctor service.
//!
//! This module provides the `ApiClient` for signing up, signing in, verifying
//! the stored JWT, loading the doctor profile and listing patient requests.
//! Failed calls are classified into `ApiError`, whose `Display` is the
//! message shown to the user.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthResponse, UnauthorizedHandler};
pub use error::{status_message, format_validation_errors, ApiError, ErrorKind, RequestFailure};
