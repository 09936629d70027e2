//! Tracker Client – headless mirror of the tracking dashboard, fed by the
//! server's realtime channel.

pub mod api;
pub mod channel;
pub mod command;
pub mod page;
