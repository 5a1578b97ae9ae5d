//! The authenticated RPC contract to the remote item store, plus the
//! client-side session (token) that gates it.
//!
//! [`RemoteItemClient`] is the contract boundary: [`http::HttpItemClient`]
//! is a real transport over HTTP+JSON; [`memory::InMemoryRemoteStore`] is an
//! in-process reference server used by tests and the bundled demo.

mod authenticator;
pub mod client;
mod error;
pub mod http;
pub mod memory;

pub use authenticator::Authenticator;
pub use client::{NewRemoteItem, RemoteItem, RemoteItemClient, SharedToken};
pub use error::{Error, Result};
pub use http::HttpItemClient;
pub use memory::InMemoryRemoteStore;
