//! Core types and the identity consolidation algorithm for Strand.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ContactStore`]; transports drive
//! [`resolver::IdentityResolver`].

pub mod contact;
pub mod error;
pub mod identity;
pub mod lock;
pub mod memory;
pub mod request;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
