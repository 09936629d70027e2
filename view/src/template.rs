//! Initial element state as the server renders it, for [`MemoryDom`] pages.

use tracker_common::protocol::VehicleId;

use crate::dom::{Element, MemoryDom};
use crate::render;
use crate::signal;
use crate::target::{self, View};

/// Add the notification container.
pub fn notification_container(dom: &mut MemoryDom, id: &str) {
    dom.insert(id, Element::with_classes("notification-container"));
}

/// Add the detail-view status elements (the map is added separately with
/// [`MemoryDom::with_map`]).
pub fn detail_view(dom: &mut MemoryDom) {
    status_elements(dom, &View::Detail, "signal-bars");
}

/// Add one dashboard card's elements.
pub fn dashboard_card(dom: &mut MemoryDom, vehicle: &VehicleId) {
    let view = View::Card(vehicle.clone());
    status_elements(dom, &view, "signal signal-bars");
    for base in [target::LAT, target::LNG] {
        let mut e = Element::default();
        e.text = render::coordinate(0.0);
        dom.insert(&view.id(base), e);
    }
}

fn status_elements(dom: &mut MemoryDom, view: &View, signal_prefix: &str) {
    let mut speed = Element::default();
    speed.text = render::speed(0.0);
    dom.insert(&view.id(target::SPEED), speed);

    dom.insert(&view.id(target::LAST_UPDATED), Element::default());

    let mut sig = Element::with_classes(&format!(
        "{signal_prefix} {}",
        signal::SignalClass::of(0).as_str()
    ));
    sig.inner_html = signal::icon_html(0);
    dom.insert(&view.id(target::SIGNAL), sig);

    badge(dom, &view.id(target::VEHICLE_STATE), render::vehicle_state(false));
    badge(dom, &view.id(target::CONTROL_STATE), render::control_state(false));
    badge(dom, &view.id(target::AUDIO_STATE), render::audio_state(false));

    toggle(dom, &view.id(target::AUDIO_TOGGLE), render::audio_toggle(false));
    toggle(dom, &view.id(target::SHUTDOWN_TOGGLE), render::shutdown_toggle(false));
}

fn badge(dom: &mut MemoryDom, id: &str, look: render::Badge) {
    let mut e = Element::with_classes(look.class);
    e.text = look.text.to_string();
    dom.insert(id, e);
}

fn toggle(dom: &mut MemoryDom, id: &str, look: render::ToggleLook) {
    let mut e = Element::with_classes(&format!("btn btn-sm {}", look.add));
    e.title = look.title.to_string();
    e.inner_html = look.inner_html;
    dom.insert(id, e);
}
