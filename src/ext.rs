//! Public extension contracts (request/response interceptors, session observers).
//!
//! The gateway applies interceptors around the base transport call and reports session
//! endings to an observer instead of navigating itself, so UI shells stay in charge of
//! routing.

pub mod interceptor;
pub mod session_observer;

pub use interceptor::*;
pub use session_observer::*;
