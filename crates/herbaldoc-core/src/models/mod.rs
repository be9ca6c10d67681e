//! Data models for HerbalDoc entities.
//!
//! - `Doctor`: display view over the cached user record
//! - `PatientRequest`: consultation requests with status/priority helpers
//! - `LoginForm`, `SignupForm`: request bodies with required-field checks

pub mod doctor;
pub mod forms;
pub mod patient_request;

pub use doctor::Doctor;
pub use forms::{LoginForm, SignupForm};
pub use patient_request::{PatientRequest, PatientRequestsResponse, Priority, RequestStatus};
