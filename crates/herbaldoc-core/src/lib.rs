//! Core library for the HerbalDoc doctor app.
//!
//! A doctor signs in through [`ApiClient`], which keeps the bearer token and
//! the doctor record in a [`Session`]. The session is created once from the
//! [`Config`] and handed to the client; a 401 from the server clears it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::Session;
pub use config::Config;
