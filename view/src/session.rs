//! Per-page session context: the vehicle being viewed plus the notifier.
//!
//! Everything the live handlers read or mutate lives here and is passed
//! in explicitly; there is no global state.

use tracing::{debug, info, warn};

use tracker_common::protocol::{
    self, AudioCommand, AudioEvent, AudioToggleResponse, InboundEvent, OutboundFrame,
    ShutdownEvent, ShutdownResponse, VehicleId,
};

use crate::dom::Dom;
use crate::notifier::{Level, Notifier, Toast};
use crate::render;
use crate::updater::{self, ApplyReport};

/// Result of handling one event: what each view did, plus the toast the
/// caller must drive to dismissal (if one was shown).
#[derive(Debug, Default)]
pub struct Dispatch {
    pub report: ApplyReport,
    pub toast: Option<Toast>,
}

#[derive(Debug)]
pub struct Session {
    current: Option<VehicleId>,
    notifier: Notifier,
}

impl Session {
    pub fn new(notifier: Notifier) -> Self {
        Session {
            current: None,
            notifier,
        }
    }

    /// The vehicle shown in the detail view, if any.
    pub fn current(&self) -> Option<&VehicleId> {
        self.current.as_ref()
    }

    /// Track `vehicle` and return the frame that subscribes to it.
    pub fn join(&mut self, vehicle: VehicleId) -> OutboundFrame {
        info!("Joined room for vehicle {vehicle}");
        self.current = Some(vehicle.clone());
        OutboundFrame::Join {
            vehicle_id: vehicle,
        }
    }

    /// Frame to replay after a reconnect.
    pub fn rejoin_frame(&self) -> Option<OutboundFrame> {
        self.current.clone().map(|vehicle_id| OutboundFrame::Join { vehicle_id })
    }

    /// Decode and handle one raw channel message. Malformed messages are
    /// logged and dropped.
    pub fn handle_raw(&mut self, dom: &mut dyn Dom, raw: &str) -> Option<Dispatch> {
        match protocol::decode(raw) {
            Ok(event) => Some(self.handle(dom, &event)),
            Err(e) => {
                warn!("Dropping message: {e}");
                debug!("Dropped message body: {raw}");
                None
            }
        }
    }

    pub fn handle(&mut self, dom: &mut dyn Dom, event: &InboundEvent) -> Dispatch {
        debug!("Received {} for vehicle {}", event.kind().name(), event.vehicle_id());
        let current = self.current.as_ref();
        match event {
            InboundEvent::Location(ev) => Dispatch {
                report: updater::apply_location(dom, ev, current),
                toast: None,
            },
            InboundEvent::Shutdown(ev) => {
                let report = updater::apply_shutdown(dom, ev, current);
                let toast = report
                    .any_updated()
                    .then(|| self.notify(dom, &render::shutdown_notice(ev.shutdown), Level::Primary))
                    .flatten();
                Dispatch { report, toast }
            }
            InboundEvent::Audio(ev) => {
                let report = updater::apply_audio(dom, ev, current);
                let toast = report
                    .any_updated()
                    .then(|| {
                        let notice = render::audio_notice(ev.command.is_transmitting());
                        self.notify(dom, &notice, Level::Primary)
                    })
                    .flatten();
                Dispatch { report, toast }
            }
        }
    }

    /// Project the reply of the shutdown toggle endpoint. A successful reply
    /// updates the views like a pushed `shutdown_command`; any reply shows
    /// its message.
    pub fn apply_shutdown_response(
        &mut self,
        dom: &mut dyn Dom,
        vehicle: &VehicleId,
        resp: &ShutdownResponse,
    ) -> Dispatch {
        if !resp.is_success() {
            warn!("Shutdown toggle for {vehicle} failed: {}", resp.message);
            return Dispatch {
                report: ApplyReport::default(),
                toast: self.notify(dom, &resp.message, Level::Danger),
            };
        }
        let event = ShutdownEvent {
            vehicle_id: vehicle.clone(),
            shutdown: resp.shutdown,
        };
        Dispatch {
            report: updater::apply_shutdown(dom, &event, self.current.as_ref()),
            toast: self.notify(dom, &resp.message, Level::Primary),
        }
    }

    /// Same as [`Session::apply_shutdown_response`] for the audio toggle.
    pub fn apply_audio_response(
        &mut self,
        dom: &mut dyn Dom,
        vehicle: &VehicleId,
        resp: &AudioToggleResponse,
    ) -> Dispatch {
        if !resp.is_success() {
            warn!("Audio toggle for {vehicle} failed: {}", resp.message);
            return Dispatch {
                report: ApplyReport::default(),
                toast: self.notify(dom, &resp.message, Level::Danger),
            };
        }
        let command = if resp.transmit_audio {
            AudioCommand::TransmitAudio
        } else {
            AudioCommand::Other("stop_audio".into())
        };
        let event = AudioEvent {
            vehicle_id: vehicle.clone(),
            command,
        };
        Dispatch {
            report: updater::apply_audio(dom, &event, self.current.as_ref()),
            toast: self.notify(dom, &resp.message, Level::Primary),
        }
    }

    /// Show an error toast (transport failures and the like).
    pub fn notify_error(&self, dom: &mut dyn Dom, message: &str) -> Option<Toast> {
        self.notify(dom, &format!("Error: {message}"), Level::Danger)
    }

    /// Toast for a realtime channel that cannot connect.
    pub fn notify_connection_error(&self, dom: &mut dyn Dom, detail: &str) -> Option<Toast> {
        self.notify(dom, &format!("Error de conexión WebSocket: {detail}"), Level::Danger)
    }

    fn notify(&self, dom: &mut dyn Dom, message: &str, level: Level) -> Option<Toast> {
        self.notifier.show(dom, message, level)
    }
}
