//! Headless page: an in-memory copy of the detail view and dashboard cards
//! driven by the live channel.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use tracker_common::config::Config;
use tracker_common::protocol::{
    AudioToggleResponse, LatLng, OutboundFrame, ShutdownResponse, VehicleId,
};
use tracker_view::template;
use tracker_view::{Dispatch, MemoryDom, Notifier, Session, Toast};

use crate::channel::{ChannelError, Subscriber};

/// Map position before the first fix arrives.
const DEFAULT_CENTER: LatLng = LatLng {
    lat: -34.6037,
    lng: -58.3816,
};

pub struct Page {
    session: RefCell<Session>,
    dom: Rc<RefCell<MemoryDom>>,
}

impl Page {
    /// Build the page the config describes: a detail view with a map when
    /// `VEHICLE_ID` is set, one card per `DASHBOARD_VEHICLES` entry, and
    /// the notification container.
    pub fn new(config: &Config) -> Self {
        let mut dom = MemoryDom::new();
        if config.vehicle_id.is_some() {
            dom = dom.with_map(DEFAULT_CENTER);
            template::detail_view(&mut dom);
        }
        for vehicle in &config.dashboard_vehicles {
            template::dashboard_card(&mut dom, vehicle);
        }
        template::notification_container(&mut dom, &config.notification_container);

        Page {
            session: RefCell::new(Session::new(Notifier::from_config(config))),
            dom: Rc::new(RefCell::new(dom)),
        }
    }

    pub fn dom(&self) -> Rc<RefCell<MemoryDom>> {
        self.dom.clone()
    }

    pub fn current(&self) -> Option<VehicleId> {
        self.session.borrow().current().cloned()
    }

    /// Track `vehicle`; returns the frame to send on the channel.
    pub fn join(&self, vehicle: VehicleId) -> OutboundFrame {
        self.session.borrow_mut().join(vehicle)
    }

    pub fn apply_shutdown_response(&self, vehicle: &VehicleId, resp: &ShutdownResponse) {
        let dispatch = self
            .session
            .borrow_mut()
            .apply_shutdown_response(&mut *self.dom.borrow_mut(), vehicle, resp);
        self.finish(dispatch);
    }

    pub fn apply_audio_response(&self, vehicle: &VehicleId, resp: &AudioToggleResponse) {
        let dispatch = self
            .session
            .borrow_mut()
            .apply_audio_response(&mut *self.dom.borrow_mut(), vehicle, resp);
        self.finish(dispatch);
    }

    pub fn notify_error(&self, message: &str) {
        let toast = self
            .session
            .borrow()
            .notify_error(&mut *self.dom.borrow_mut(), message);
        self.schedule(toast);
    }

    /// Human-readable dump of every element, one per line.
    pub fn render(&self) -> String {
        let dom = self.dom.borrow();
        let mut out = String::new();
        if let Some(pos) = dom.marker() {
            out.push_str(&format!("marker  {:.6}, {:.6}\n", pos.lat, pos.lng));
        }
        for (id, e) in dom.elements() {
            let content = if e.text.is_empty() { &e.inner_html } else { &e.text };
            out.push_str(&format!("{id:<28} [{}] {content}\n", e.classes.join(" ")));
        }
        out
    }

    fn finish(&self, dispatch: Dispatch) {
        debug!("Applied: {:?}", dispatch.report);
        self.schedule(dispatch.toast);
    }

    /// Drive a toast to dismissal on the local task set.
    fn schedule(&self, toast: Option<Toast>) {
        if let Some(toast) = toast {
            tokio::task::spawn_local(toast.run(self.dom.clone()));
        }
    }
}

impl Subscriber for Page {
    fn resubscribe(&self) -> Option<OutboundFrame> {
        let frame = self.session.borrow().rejoin_frame();
        if let Some(OutboundFrame::Join { vehicle_id }) = &frame {
            info!("Re-joining room for vehicle {vehicle_id}");
        }
        frame
    }

    fn on_message(&self, raw: &str) {
        let dispatch = self
            .session
            .borrow_mut()
            .handle_raw(&mut *self.dom.borrow_mut(), raw);
        if let Some(dispatch) = dispatch {
            self.finish(dispatch);
        }
    }

    fn on_connect_error(&self, error: &ChannelError) {
        let toast = self
            .session
            .borrow()
            .notify_connection_error(&mut *self.dom.borrow_mut(), &error.to_string());
        self.schedule(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_view::Dom;

    fn config() -> Config {
        Config {
            vehicle_id: VehicleId::parse("42"),
            dashboard_vehicles: vec![VehicleId::from(42), VehicleId::from(7)],
            ..Config::default()
        }
    }

    #[test]
    fn test_page_layout_follows_config() {
        let page = Page::new(&config());
        let dom = page.dom();
        let dom = dom.borrow();
        assert!(dom.marker().is_some());
        assert!(dom.contains("speed"));
        assert!(dom.contains("speed-42"));
        assert!(dom.contains("lat-7"));
        assert!(dom.contains("notification-container"));
    }

    #[test]
    fn test_dashboard_only_page_has_no_map() {
        let config = Config {
            dashboard_vehicles: vec![VehicleId::from(1)],
            ..Config::default()
        };
        let page = Page::new(&config);
        assert!(page.dom().borrow().marker().is_none());
        assert!(!page.dom().borrow().contains("speed"));
    }

    #[test]
    fn test_on_message_updates_card() {
        let page = Page::new(&config());
        page.on_message(r#"{"event":"location_update","data":{"vehicle_id":7,"lat":1.0,"lng":2.0,"speed":9.5}}"#);
        assert_eq!(page.dom().borrow().text("speed-7"), Some("9.50 km/h"));
        // Not joined yet, so the detail view stays put.
        assert_eq!(page.dom().borrow().text("speed"), Some("0.00 km/h"));
        assert!(page.render().contains("speed-7"));
    }

    #[test]
    fn test_resubscribe_after_join() {
        let page = Page::new(&config());
        assert!(page.resubscribe().is_none());
        page.join(VehicleId::from(42));
        assert!(matches!(
            page.resubscribe(),
            Some(OutboundFrame::Join { vehicle_id }) if vehicle_id.as_str() == "42"
        ));
    }
}
