//! Core domain + application logic for the random channel post bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! [`transport::port::ChannelTransport`] port implemented in an adapter crate.

pub mod boundary;
pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod probe;
pub mod refresher;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod transport;

pub use errors::{Error, Result};

#[cfg(test)]
mod test_support;
