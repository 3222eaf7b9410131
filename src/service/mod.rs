//! # Client Layer
//!
//! The [`client::Client`] contract and a framed implementation over any
//! connection a [`client::Dialer`] produces.

pub mod client;
pub mod framed;
