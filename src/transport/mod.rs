//! # Transports
//!
//! Concrete dialers. TCP is the only one shipped; other transports plug in by
//! implementing [`crate::service::client::Dialer`].

pub mod tcp;
