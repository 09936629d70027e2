//! Tracker View – live projection of vehicle events onto the dashboard
//! and vehicle-detail pages.

pub mod dom;
pub mod notifier;
pub mod render;
pub mod session;
pub mod signal;
pub mod target;
pub mod template;
pub mod updater;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "hydrate", target_arch = "wasm32"))] {
        pub mod browser;
    }
}

pub use dom::{Dom, MemoryDom};
pub use notifier::{Level, Notifier, Toast};
pub use session::{Dispatch, Session};
pub use updater::{apply_audio, apply_location, apply_shutdown, ApplyReport, Outcome};
