//! Credential models, storage keys, and session payloads.

pub mod credential;
pub mod key;
pub mod session;

pub use credential::*;
pub use key::*;
pub use session::*;
