//! Browser bindings: [`Dom`] over `web_sys::Document` and the entry points
//! the page scripts call.
//!
//! The page keeps its own socket and `fetch` calls and hands the payloads
//! to `handleMessage` / `applyShutdownResponse`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

use tracker_common::config::Config;
use tracker_common::protocol::{LatLng, ShutdownResponse, VehicleId};

use crate::dom::Dom;
use crate::notifier::{Notifier, Toast};
use crate::session::Session;

/// Diagnostics at or above this level reach the browser console.
const CONSOLE_LEVEL: log::Level = log::Level::Info;

#[wasm_bindgen]
extern "C" {
    /// Provided by the map script; moves the marker and recentres the map.
    #[wasm_bindgen(js_namespace = window, js_name = updateMarkerPosition, catch)]
    fn update_marker_position(lat: f64, lng: f64) -> Result<(), JsValue>;
}

pub struct BrowserDom {
    document: Document,
}

impl BrowserDom {
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(BrowserDom { document })
    }

    fn el(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }
}

impl Dom for BrowserDom {
    fn contains(&self, id: &str) -> bool {
        self.el(id).is_some()
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(el) = self.el(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class_name(&mut self, id: &str, class: &str) {
        if let Some(el) = self.el(id) {
            el.set_class_name(class);
        }
    }

    fn add_class(&mut self, id: &str, class: &str) {
        if let Some(el) = self.el(id) {
            if el.class_list().add_1(class).is_err() {
                warn!("Cannot add class {class} to #{id}");
            }
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        if let Some(el) = self.el(id) {
            if el.class_list().remove_1(class).is_err() {
                warn!("Cannot remove class {class} from #{id}");
            }
        }
    }

    fn set_title(&mut self, id: &str, title: &str) {
        if let Some(el) = self.el(id) {
            if el.set_attribute("title", title).is_err() {
                warn!("Cannot set title on #{id}");
            }
        }
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(el) = self.el(id) {
            el.set_inner_html(html);
        }
    }

    fn append_element(&mut self, parent: &str, id: &str, class: &str, inner_html: &str) -> bool {
        let Some(parent) = self.el(parent) else {
            return false;
        };
        let Ok(node) = self.document.create_element("div") else {
            return false;
        };
        node.set_id(id);
        node.set_class_name(class);
        node.set_inner_html(inner_html);
        parent.append_child(&node).is_ok()
    }

    fn remove_element(&mut self, id: &str) -> bool {
        match self.el(id) {
            Some(el) => {
                el.remove();
                true
            }
            None => false,
        }
    }

    fn move_marker(&mut self, pos: LatLng) -> bool {
        update_marker_position(pos.lat, pos.lng).is_ok()
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

struct App {
    session: Session,
    dom: Rc<RefCell<BrowserDom>>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| app.borrow_mut().as_mut().map(f))
}

fn schedule(dom: &Rc<RefCell<BrowserDom>>, toast: Option<Toast>) {
    if let Some(toast) = toast {
        wasm_bindgen_futures::spawn_local(toast.run(dom.clone()));
    }
}

/// Set up the session. `config_json` is an optional serialised `Config`.
#[wasm_bindgen]
pub fn start(config_json: Option<String>) {
    console_error_panic_hook::set_once();
    // Fails only when already installed by an earlier call.
    let _ = console_log::init_with_level(CONSOLE_LEVEL);

    let config: Config = config_json
        .and_then(|raw| match serde_json::from_str(&raw) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Ignoring invalid config: {e}");
                None
            }
        })
        .unwrap_or_default();

    let Some(dom) = BrowserDom::new() else {
        warn!("No document; live updates disabled");
        return;
    };

    let app = App {
        session: Session::new(Notifier::from_config(&config)),
        dom: Rc::new(RefCell::new(dom)),
    };
    APP.with(|slot| *slot.borrow_mut() = Some(app));
}

/// Track `vehicle_id` and return the join frame for the page to emit.
#[wasm_bindgen(js_name = joinVehicleRoom)]
pub fn join_vehicle_room(vehicle_id: &str) -> Option<String> {
    with_app(|app| {
        let Some(vehicle) = VehicleId::parse(vehicle_id) else {
            warn!("Vehicle id not provided");
            let toast = app
                .session
                .notify_error(&mut *app.dom.borrow_mut(), "ID de vehículo no proporcionado");
            schedule(&app.dom, toast);
            return None;
        };
        let frame = app.session.join(vehicle);
        match frame.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Cannot encode join frame: {e}");
                None
            }
        }
    })
    .flatten()
}

/// Frame to re-emit after the page's socket reconnects.
#[wasm_bindgen(js_name = rejoinFrame)]
pub fn rejoin_frame() -> Option<String> {
    with_app(|app| app.session.rejoin_frame().and_then(|f| f.to_json().ok())).flatten()
}

/// Handle one message received on the page's socket.
#[wasm_bindgen(js_name = handleMessage)]
pub fn handle_message(raw: &str) {
    with_app(|app| {
        let dispatch = app.session.handle_raw(&mut *app.dom.borrow_mut(), raw);
        if let Some(d) = dispatch {
            schedule(&app.dom, d.toast);
        }
    });
}

/// Apply the JSON reply of `POST /api/vehicle/{id}/shutdown`.
#[wasm_bindgen(js_name = applyShutdownResponse)]
pub fn apply_shutdown_response(vehicle_id: &str, raw: &str) {
    with_app(|app| {
        let mut dom = app.dom.borrow_mut();
        let toast = match (VehicleId::parse(vehicle_id), serde_json::from_str::<ShutdownResponse>(raw)) {
            (Some(vehicle), Ok(resp)) => {
                app.session.apply_shutdown_response(&mut *dom, &vehicle, &resp).toast
            }
            (None, _) => app.session.notify_error(&mut *dom, "ID de vehículo no proporcionado"),
            (_, Err(e)) => app.session.notify_error(&mut *dom, &e.to_string()),
        };
        drop(dom);
        schedule(&app.dom, toast);
    });
}
