//! Live projection of vehicle events onto the page.
//!
//! Each event kind has a binding table: one row per view, holding the
//! row's target resolver, the elements it needs, and the field updater.
//! Every row is evaluated on every event, independently of the others, so
//! a page may carry the detail view, a dashboard card, both, or neither.
//!
//! A row whose element group is incomplete is skipped as a whole.

use tracing::{debug, warn};

use tracker_common::protocol::{AudioEvent, LatLng, LocationEvent, ShutdownEvent, VehicleId};

use crate::dom::Dom;
use crate::render;
use crate::signal::{self, SignalClass};
use crate::target::{self, Presence, View, ViewKind};

/// What happened to one view for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    Updated,
    /// Detail view only: the event is for a vehicle other than the one
    /// being viewed.
    #[default]
    NotSubscribed,
    /// The page does not carry this view.
    Absent,
    /// The page carries only part of the view; nothing was written.
    Incomplete(Vec<String>),
}

/// Per-view outcome of one apply call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub detail: Outcome,
    pub card: Outcome,
}

impl ApplyReport {
    pub fn any_updated(&self) -> bool {
        self.detail == Outcome::Updated || self.card == Outcome::Updated
    }

    fn set(&mut self, kind: ViewKind, outcome: Outcome) {
        match kind {
            ViewKind::Detail => self.detail = outcome,
            ViewKind::Card => self.card = outcome,
        }
    }
}

// ─── Binding table ───────────────────────────────────────────────────────────

type Resolver = fn(&VehicleId, Option<&VehicleId>) -> Option<View>;

struct Binding<F: 'static> {
    kind: ViewKind,
    resolve: Resolver,
    required: &'static [&'static str],
    update: fn(&mut dyn Dom, &View, &F),
}

fn detail_if_subscribed(vehicle: &VehicleId, current: Option<&VehicleId>) -> Option<View> {
    (current == Some(vehicle)).then_some(View::Detail)
}

fn card_for(vehicle: &VehicleId, _current: Option<&VehicleId>) -> Option<View> {
    Some(View::Card(vehicle.clone()))
}

fn run<F>(
    dom: &mut dyn Dom,
    table: &[Binding<F>],
    event: &str,
    vehicle: &VehicleId,
    current: Option<&VehicleId>,
    fields: &F,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for binding in table {
        let outcome = match (binding.resolve)(vehicle, current) {
            None => {
                debug!(
                    "{event}: vehicle {vehicle} is not the viewed one ({})",
                    current.map_or("none", |c| c.as_str())
                );
                Outcome::NotSubscribed
            }
            Some(view) => match target::resolve(dom, &view, binding.required) {
                Presence::Complete => {
                    (binding.update)(dom, &view, fields);
                    debug!("{event}: updated {} view of vehicle {vehicle}", binding.kind.name());
                    Outcome::Updated
                }
                Presence::Missing => {
                    debug!("{event}: no {} view for vehicle {vehicle}", binding.kind.name());
                    Outcome::Absent
                }
                Presence::Partial(missing) => {
                    warn!(
                        "{event}: {} view of vehicle {vehicle} is missing {}; skipped",
                        binding.kind.name(),
                        missing.join(", ")
                    );
                    Outcome::Incomplete(missing)
                }
            },
        };
        report.set(binding.kind, outcome);
    }
    report
}

// ─── Location ────────────────────────────────────────────────────────────────

/// Location fields after parsing. `None` marks a value that failed to
/// parse; the element keeps its last value.
#[derive(Debug, Clone)]
struct LocationFields {
    position: Option<LatLng>,
    speed: Option<f64>,
    signal: Option<i64>,
    vehicle_on: bool,
    shutdown: bool,
    transmit_audio: bool,
    last_updated: String,
}

impl LocationFields {
    fn from_event(ev: &LocationEvent) -> Self {
        let position = ev.position();
        if position.is_none() {
            warn!(
                "location_update for {}: invalid coordinates lat={:?} lng={:?}; keeping last position",
                ev.vehicle_id, ev.lat, ev.lng
            );
        }
        let speed = ev.speed_kmh();
        if speed.is_none() {
            warn!("location_update for {}: invalid speed {:?}", ev.vehicle_id, ev.speed);
        }
        let signal = ev.signal();
        if signal.is_none() {
            warn!(
                "location_update for {}: invalid signal_quality {:?}",
                ev.vehicle_id, ev.signal_quality
            );
        }
        LocationFields {
            position,
            speed,
            signal,
            vehicle_on: ev.vehicle_on,
            shutdown: ev.shutdown,
            transmit_audio: ev.transmit_audio,
            last_updated: ev.last_updated.clone().unwrap_or_else(render::now_display),
        }
    }
}

const DETAIL_LOCATION: &[&str] = &[
    target::SPEED,
    target::LAST_UPDATED,
    target::SIGNAL,
    target::VEHICLE_STATE,
    target::CONTROL_STATE,
    target::AUDIO_STATE,
    target::AUDIO_TOGGLE,
];

const CARD_LOCATION: &[&str] = &[
    target::LAT,
    target::LNG,
    target::SPEED,
    target::SIGNAL,
    target::VEHICLE_STATE,
    target::CONTROL_STATE,
    target::AUDIO_STATE,
    target::AUDIO_TOGGLE,
    target::LAST_UPDATED,
];

const LOCATION_TABLE: &[Binding<LocationFields>] = &[
    Binding {
        kind: ViewKind::Detail,
        resolve: detail_if_subscribed,
        required: DETAIL_LOCATION,
        update: update_detail_location,
    },
    Binding {
        kind: ViewKind::Card,
        resolve: card_for,
        required: CARD_LOCATION,
        update: update_card_location,
    },
];

fn update_detail_location(dom: &mut dyn Dom, view: &View, f: &LocationFields) {
    if let Some(pos) = f.position {
        if !dom.move_marker(pos) {
            debug!("no map on this page; marker not moved");
        }
    }
    write_status(dom, view, f, "signal-bars");
}

fn update_card_location(dom: &mut dyn Dom, view: &View, f: &LocationFields) {
    if let Some(pos) = f.position {
        dom.set_text(&view.id(target::LAT), &render::coordinate(pos.lat));
        dom.set_text(&view.id(target::LNG), &render::coordinate(pos.lng));
    }
    write_status(dom, view, f, "signal signal-bars");
}

/// Fields shared by both location views.
fn write_status(dom: &mut dyn Dom, view: &View, f: &LocationFields, signal_prefix: &str) {
    if let Some(speed) = f.speed {
        dom.set_text(&view.id(target::SPEED), &render::speed(speed));
    }
    if let Some(signal) = f.signal {
        let id = view.id(target::SIGNAL);
        dom.set_class_name(
            &id,
            &format!("{signal_prefix} {}", SignalClass::of(signal).as_str()),
        );
        dom.set_inner_html(&id, &signal::icon_html(signal));
    }
    write_badge(dom, &view.id(target::VEHICLE_STATE), render::vehicle_state(f.vehicle_on));
    write_badge(dom, &view.id(target::CONTROL_STATE), render::control_state(f.shutdown));
    write_audio(dom, view, f.transmit_audio);
    dom.set_text(&view.id(target::LAST_UPDATED), &f.last_updated);
}

/// Update the detail view (when `event` is for `current`) and the event
/// vehicle's dashboard card from a location snapshot.
pub fn apply_location(
    dom: &mut dyn Dom,
    event: &LocationEvent,
    current: Option<&VehicleId>,
) -> ApplyReport {
    let fields = LocationFields::from_event(event);
    run(
        dom,
        LOCATION_TABLE,
        "location_update",
        &event.vehicle_id,
        current,
        &fields,
    )
}

// ─── Shutdown ────────────────────────────────────────────────────────────────

const SHUTDOWN_FIELDS: &[&str] = &[target::SHUTDOWN_TOGGLE, target::CONTROL_STATE];

const SHUTDOWN_TABLE: &[Binding<bool>] = &[
    Binding {
        kind: ViewKind::Detail,
        resolve: detail_if_subscribed,
        required: SHUTDOWN_FIELDS,
        update: write_shutdown,
    },
    Binding {
        kind: ViewKind::Card,
        resolve: card_for,
        required: SHUTDOWN_FIELDS,
        update: write_shutdown,
    },
];

fn write_shutdown(dom: &mut dyn Dom, view: &View, shutdown: &bool) {
    write_toggle(
        dom,
        &view.id(target::SHUTDOWN_TOGGLE),
        render::shutdown_toggle(*shutdown),
    );
    write_badge(dom, &view.id(target::CONTROL_STATE), render::control_state(*shutdown));
}

/// Update the power-cut toggle and control badge.
pub fn apply_shutdown(
    dom: &mut dyn Dom,
    event: &ShutdownEvent,
    current: Option<&VehicleId>,
) -> ApplyReport {
    run(
        dom,
        SHUTDOWN_TABLE,
        "shutdown_command",
        &event.vehicle_id,
        current,
        &event.shutdown,
    )
}

// ─── Audio ───────────────────────────────────────────────────────────────────

const AUDIO_FIELDS: &[&str] = &[target::AUDIO_TOGGLE, target::AUDIO_STATE];

const AUDIO_TABLE: &[Binding<bool>] = &[
    Binding {
        kind: ViewKind::Detail,
        resolve: detail_if_subscribed,
        required: AUDIO_FIELDS,
        update: write_audio_ref,
    },
    Binding {
        kind: ViewKind::Card,
        resolve: card_for,
        required: AUDIO_FIELDS,
        update: write_audio_ref,
    },
];

fn write_audio_ref(dom: &mut dyn Dom, view: &View, transmitting: &bool) {
    write_audio(dom, view, *transmitting);
}

fn write_audio(dom: &mut dyn Dom, view: &View, transmitting: bool) {
    write_badge(dom, &view.id(target::AUDIO_STATE), render::audio_state(transmitting));
    write_toggle(
        dom,
        &view.id(target::AUDIO_TOGGLE),
        render::audio_toggle(transmitting),
    );
}

/// Update the audio toggle and audio badge.
pub fn apply_audio(
    dom: &mut dyn Dom,
    event: &AudioEvent,
    current: Option<&VehicleId>,
) -> ApplyReport {
    run(
        dom,
        AUDIO_TABLE,
        "audio_command",
        &event.vehicle_id,
        current,
        &event.command.is_transmitting(),
    )
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn write_badge(dom: &mut dyn Dom, id: &str, badge: render::Badge) {
    dom.set_class_name(id, badge.class);
    dom.set_text(id, badge.text);
}

fn write_toggle(dom: &mut dyn Dom, id: &str, look: render::ToggleLook) {
    dom.remove_class(id, look.remove);
    dom.add_class(id, look.add);
    dom.set_title(id, look.title);
    dom.set_inner_html(id, &look.inner_html);
}
