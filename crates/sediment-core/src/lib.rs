//! Sediment Core — shared event-sourcing abstractions.
//!
//! This crate defines the fundamental traits and types the storage and
//! runtime crates depend on. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod codec;
pub mod command;
pub mod envelope;
pub mod error;
pub mod event;
pub mod snapshot;
pub mod store;
pub mod stream;
