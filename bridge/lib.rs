//! Typed signal bridge between a music player front end and its playback
//! backend.
//!
//! The front end sends [`signals::Request`]s through a [`SignalBridge`] and
//! either fires and forgets ([`SignalBridge::send`]) or waits for the
//! correlated answer ([`SignalBridge::request`]). Responses are also
//! published per type as [`SignalStream`]s.

pub mod backend;
pub mod bridge;
pub mod config;
pub mod dbus;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod export;
pub mod fetch;
pub mod library;
pub mod logging;
pub mod player;
pub mod scan;
pub mod signals;
pub mod transport;

pub use crate::bridge::{SignalBridge, SignalStream};
pub use crate::error::App;
