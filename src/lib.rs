// #![deny(warnings)]

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

//! Conversion of modern (v5) Kerberos tickets into legacy (v4) tickets.
//!
//! A [`proto::TicketConverter`] decrypts a modern ticket with the source service
//! key, checks that it is usable now and from the client's address, and issues a
//! legacy ticket for the same client and session key sealed under the destination
//! service key.

mod asn1;
pub(crate) mod constants;
pub(crate) mod crypto;
pub mod error;
pub mod proto;

pub use crate::error::KrbError;
