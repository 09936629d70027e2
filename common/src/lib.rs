//! Shared types for the vehicle tracker: configuration and the wire
//! protocol spoken with the tracking server.

pub mod config;
pub mod protocol;
