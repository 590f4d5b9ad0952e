//! Shared types, validation and client SDK for Quizgen.
//!
//! - [`objects`]: request and response bodies of the HTTP API and the
//!   realtime channel.
//! - [`validation`]: the creation and answer rules, applied identically by
//!   the server and by clients before they send anything.
//! - [`signature`]: session tokens, signed cookies and realtime fabric
//!   signatures.
//! - [`session`]: the client reconciliation state machine.
//! - `client` (feature `client`): HTTP and websocket implementations of the
//!   session's backend traits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
pub mod session;
pub mod signature;
pub mod validation;

#[cfg(feature = "client")]
pub mod client;
