//! A provider-neutral protocol for talking to chat models.
//!
//! The agent only depends on the types in this crate, so any backend that
//! implements [`ModelProvider`] can drive it: a hosted OpenAI-compatible
//! endpoint, a scripted fake for tests, and so on.
//!
//! Types in this crate don't define any behavior, they are the contract
//! implementors must follow.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
