//! Session persistence for the signed-in doctor.
//!
//! This module provides:
//! - `Session`: token and cached user record with get/set/clear
//! - `KeyValueStore`: the storage seam, with file, keyring and in-memory backends
//!
//! Sessions have no local expiry; the server decides, and a 401 clears them.

pub mod session;
pub mod store;

pub use session::{Session, TOKEN_KEY, USER_DATA_KEY};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
