//! Element naming schemes and group resolution.
//!
//! The detail page uses bare ids (`speed`, `control-state`, ...). The
//! dashboard repeats the same fields once per vehicle card, with the ids
//! suffixed by the vehicle id (`speed-42`, `control-state-42`, ...).

use tracker_common::protocol::VehicleId;

use crate::dom::Dom;

// ── element base names ───────────────────────────────────────────────────
pub const SPEED: &str = "speed";
pub const LAST_UPDATED: &str = "last-updated";
pub const SIGNAL: &str = "signal-quality";
pub const VEHICLE_STATE: &str = "vehicle-state";
pub const CONTROL_STATE: &str = "control-state";
pub const AUDIO_STATE: &str = "audio-state";
pub const AUDIO_TOGGLE: &str = "audioToggle";
pub const SHUTDOWN_TOGGLE: &str = "shutdownToggle";
pub const LAT: &str = "lat";
pub const LNG: &str = "lng";

/// Which view a group of elements belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Detail,
    Card,
}

impl ViewKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Detail => "detail",
            Self::Card => "card",
        }
    }
}

/// A resolved naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Detail,
    Card(VehicleId),
}

impl View {
    /// Concrete element id for a base name.
    pub fn id(&self, base: &str) -> String {
        match self {
            Self::Detail => base.to_string(),
            Self::Card(vehicle) => format!("{base}-{vehicle}"),
        }
    }
}

/// Result of looking up a group of required elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// Every element exists.
    Complete,
    /// None of the elements exist: this page does not have the view.
    Missing,
    /// Some exist, some do not. The ids listed are the missing ones.
    Partial(Vec<String>),
}

/// Check that every element of `required` exists under `view`'s scheme.
pub fn resolve(dom: &dyn Dom, view: &View, required: &[&str]) -> Presence {
    let missing: Vec<String> = required
        .iter()
        .map(|base| view.id(base))
        .filter(|id| !dom.contains(id))
        .collect();

    if missing.is_empty() {
        Presence::Complete
    } else if missing.len() == required.len() {
        Presence::Missing
    } else {
        Presence::Partial(missing)
    }
}
