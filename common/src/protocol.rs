//! Wire types for the realtime channel and the HTTP side-channel.
//!
//! Two inbound shapes are accepted. Named events arrive wrapped as
//! `{"event": "location_update", "data": {...}}`; the bare form (payload
//! only) is classified by the fields it carries.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

// ─── Vehicle id ──────────────────────────────────────────────────────────────

/// Vehicle identifier, normalised to its decimal string form.
///
/// The server sends ids as JSON numbers in some payloads and as strings in
/// others; both deserialize to the same value so equality never depends on
/// the wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(String);

impl VehicleId {
    /// Normalise a textual id. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(VehicleId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for VehicleId {
    fn from(n: u64) -> Self {
        VehicleId(n.to_string())
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VehicleIdVisitor)
    }
}

struct VehicleIdVisitor;

impl Visitor<'_> for VehicleIdVisitor {
    type Value = VehicleId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a vehicle id as string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<VehicleId, E> {
        VehicleId::parse(v).ok_or_else(|| E::custom("empty vehicle id"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<VehicleId, E> {
        Ok(VehicleId::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<VehicleId, E> {
        Ok(VehicleId(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<VehicleId, E> {
        // 42.0 is still vehicle "42"; 42.5 and 1e20 are not ids.
        if v.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&v) {
            Ok(VehicleId(format!("{}", v as i64)))
        } else {
            Err(E::custom(format!("non-integer vehicle id {v}")))
        }
    }
}

// ─── Numeric fields ──────────────────────────────────────────────────────────

/// A numeric field that may arrive as a JSON number or as a string.
/// Any other JSON value is kept as `Other` and reads as invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Numeric {
    /// Finite float value, or `None` if the field does not parse.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
            Numeric::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Integer value, truncated toward zero.
    pub fn as_int(&self) -> Option<i64> {
        self.as_f64().map(|v| v.trunc() as i64)
    }
}

/// A map coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

// ─── Inbound events ──────────────────────────────────────────────────────────

/// `location_update`: full vehicle state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEvent {
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub lat: Option<Numeric>,
    #[serde(default)]
    pub lng: Option<Numeric>,
    #[serde(default)]
    pub speed: Option<Numeric>,
    #[serde(default)]
    pub signal_quality: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub vehicle_on: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub shutdown: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub transmit_audio: bool,
    /// Pre-formatted `DD-MM-YYYY HH:MM` display string.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl LocationEvent {
    /// Both coordinates, or `None` if either is missing or not a number.
    pub fn position(&self) -> Option<LatLng> {
        let lat = self.lat.as_ref()?.as_f64()?;
        let lng = self.lng.as_ref()?.as_f64()?;
        Some(LatLng { lat, lng })
    }

    /// Speed in km/h. Absent means `0.0`; `None` means present but invalid.
    pub fn speed_kmh(&self) -> Option<f64> {
        match &self.speed {
            None => Some(0.0),
            Some(n) => n.as_f64(),
        }
    }

    /// Signal quality. Absent means `0`; `None` means present but invalid.
    pub fn signal(&self) -> Option<i64> {
        match &self.signal_quality {
            None => Some(0),
            Some(n) => n.as_int(),
        }
    }
}

/// Only JSON `true` is set; `null` or any non-bool reads as unset.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// `shutdown_command`: remote power cut toggled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownEvent {
    pub vehicle_id: VehicleId,
    pub shutdown: bool,
}

/// Audio command carried by `audio_command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AudioCommand {
    TransmitAudio,
    Other(String),
}

impl AudioCommand {
    pub fn is_transmitting(&self) -> bool {
        matches!(self, AudioCommand::TransmitAudio)
    }
}

impl From<String> for AudioCommand {
    fn from(s: String) -> Self {
        if s == "transmit_audio" {
            AudioCommand::TransmitAudio
        } else {
            AudioCommand::Other(s)
        }
    }
}

impl From<AudioCommand> for String {
    fn from(c: AudioCommand) -> Self {
        match c {
            AudioCommand::TransmitAudio => "transmit_audio".to_string(),
            AudioCommand::Other(s) => s,
        }
    }
}

/// `audio_command`: audio transmission toggled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioEvent {
    pub vehicle_id: VehicleId,
    pub command: AudioCommand,
}

/// The three event kinds pushed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Location,
    Shutdown,
    Audio,
}

impl EventKind {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Location => "location_update",
            Self::Shutdown => "shutdown_command",
            Self::Audio => "audio_command",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "location_update" => Some(Self::Location),
            "shutdown_command" => Some(Self::Shutdown),
            "audio_command" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Location(LocationEvent),
    Shutdown(ShutdownEvent),
    Audio(AudioEvent),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Location(_) => EventKind::Location,
            Self::Shutdown(_) => EventKind::Shutdown,
            Self::Audio(_) => EventKind::Audio,
        }
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            Self::Location(e) => &e.vehicle_id,
            Self::Shutdown(e) => &e.vehicle_id,
            Self::Audio(e) => &e.vehicle_id,
        }
    }
}

/// Why an inbound message was dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("{0} payload has no vehicle_id")]
    MissingVehicleId(&'static str),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("cannot tell which event this payload is")]
    Unclassified,
    #[error("malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        source: serde_json::Error,
    },
}

/// Decode one text frame from the channel, envelope or bare.
pub fn decode(raw: &str) -> Result<InboundEvent, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

    if let (Some(Value::String(name)), Some(data)) = (obj.get("event"), obj.get("data")) {
        return decode_named(name, data.clone());
    }

    decode_named_kind(classify(&value)?, value)
}

/// Decode a payload whose event name is already known.
pub fn decode_named(name: &str, data: Value) -> Result<InboundEvent, DecodeError> {
    let kind = EventKind::from_name(name).ok_or_else(|| DecodeError::UnknownEvent(name.into()))?;
    decode_named_kind(kind, data)
}

fn decode_named_kind(kind: EventKind, data: Value) -> Result<InboundEvent, DecodeError> {
    let obj = data.as_object().ok_or(DecodeError::NotAnObject)?;
    if obj.get("vehicle_id").map_or(true, Value::is_null) {
        return Err(DecodeError::MissingVehicleId(kind.name()));
    }

    let wrap = |source| DecodeError::Payload {
        event: kind.name(),
        source,
    };
    Ok(match kind {
        EventKind::Location => {
            InboundEvent::Location(serde_json::from_value(data).map_err(wrap)?)
        }
        EventKind::Shutdown => {
            InboundEvent::Shutdown(serde_json::from_value(data).map_err(wrap)?)
        }
        EventKind::Audio => InboundEvent::Audio(serde_json::from_value(data).map_err(wrap)?),
    })
}

/// Guess the event kind of a bare payload from its fields.
fn classify(value: &Value) -> Result<EventKind, DecodeError> {
    if value.get("lat").is_some() || value.get("lng").is_some() {
        return Ok(EventKind::Location);
    }
    match value.get("command").and_then(Value::as_str) {
        Some("transmit_audio") | Some("stop_audio") => return Ok(EventKind::Audio),
        _ => {}
    }
    if value.get("shutdown").is_some() {
        return Ok(EventKind::Shutdown);
    }
    Err(DecodeError::Unclassified)
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// Frames sent from the client to the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Subscribe this connection to a vehicle's updates.
    Join { vehicle_id: VehicleId },
}

impl OutboundFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ─── HTTP side-channel ───────────────────────────────────────────────────────

/// Response of `POST /api/vehicle/{id}/shutdown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub shutdown: bool,
    #[serde(default)]
    pub transmit_audio: Option<bool>,
}

impl ShutdownResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `POST /api/vehicle/{id}/audio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioToggleResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub transmit_audio: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl AudioToggleResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids_normalise() {
        let a: VehicleId = serde_json::from_str("42").unwrap();
        let b: VehicleId = serde_json::from_str("\"42\"").unwrap();
        let c: VehicleId = serde_json::from_str("42.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(serde_json::from_str::<VehicleId>("42.5").is_err());
        assert!(serde_json::from_str::<VehicleId>("\"  \"").is_err());
    }

    #[test]
    fn test_out_of_range_float_ids_rejected() {
        assert!(serde_json::from_str::<VehicleId>("1e20").is_err());
        assert!(serde_json::from_str::<VehicleId>("-1e21").is_err());
        let big: VehicleId = serde_json::from_str("9007199254740992.0").unwrap();
        assert_eq!(big.as_str(), "9007199254740992");
    }

    #[test]
    fn test_wrongly_typed_fields_do_not_drop_location() {
        let raw = r#"{"event":"location_update","data":{"vehicle_id":42,"lat":true,"lng":[1],"speed":{"v":3},"signal_quality":17,"vehicle_on":null,"shutdown":"yes","transmit_audio":true}}"#;
        let InboundEvent::Location(ev) = decode(raw).unwrap() else {
            panic!("expected location");
        };
        assert_eq!(ev.position(), None);
        assert_eq!(ev.speed_kmh(), None);
        assert_eq!(ev.signal(), Some(17));
        assert!(!ev.vehicle_on);
        assert!(!ev.shutdown);
        assert!(ev.transmit_audio);
    }

    #[test]
    fn test_decode_envelope_location() {
        let raw = r#"{"event":"location_update","data":{"vehicle_id":42,"lat":-34.6,"lng":"-58.38","vehicle_on":true,"shutdown":false,"transmit_audio":true}}"#;
        let InboundEvent::Location(ev) = decode(raw).unwrap() else {
            panic!("expected location");
        };
        assert_eq!(ev.vehicle_id.as_str(), "42");
        assert_eq!(ev.position(), Some(LatLng { lat: -34.6, lng: -58.38 }));
        assert_eq!(ev.speed_kmh(), Some(0.0));
        assert_eq!(ev.signal(), Some(0));
        assert!(ev.last_updated.is_none());
    }

    #[test]
    fn test_bad_coordinate_has_no_position() {
        let raw = r#"{"vehicle_id":"3","lat":"not-a-number","lng":1.0}"#;
        let InboundEvent::Location(ev) = decode(raw).unwrap() else {
            panic!("expected location");
        };
        assert_eq!(ev.position(), None);
    }

    #[test]
    fn test_signal_truncates() {
        let ev: LocationEvent =
            serde_json::from_str(r#"{"vehicle_id":1,"signal_quality":"12.9","speed":"fast"}"#)
                .unwrap();
        assert_eq!(ev.signal(), Some(12));
        assert_eq!(ev.speed_kmh(), None);
    }

    #[test]
    fn test_classify_bare_payloads() {
        let shutdown = r#"{"vehicle_id":"5","command":"shutdown","shutdown":true}"#;
        assert_eq!(decode(shutdown).unwrap().kind(), EventKind::Shutdown);

        let audio = r#"{"vehicle_id":"5","command":"stop_audio","transmit_audio":false}"#;
        let InboundEvent::Audio(ev) = decode(audio).unwrap() else {
            panic!("expected audio");
        };
        assert_eq!(ev.command, AudioCommand::Other("stop_audio".into()));

        assert!(matches!(
            decode(r#"{"vehicle_id":"5"}"#),
            Err(DecodeError::Unclassified)
        ));
    }

    #[test]
    fn test_missing_vehicle_id_is_rejected() {
        let raw = r#"{"event":"shutdown_command","data":{"shutdown":true}}"#;
        assert!(matches!(
            decode(raw),
            Err(DecodeError::MissingVehicleId("shutdown_command"))
        ));
        let raw = r#"{"event":"audio_command","data":{"vehicle_id":null,"command":"x"}}"#;
        assert!(matches!(decode(raw), Err(DecodeError::MissingVehicleId(_))));
    }

    #[test]
    fn test_unknown_and_garbage() {
        assert!(matches!(
            decode(r#"{"event":"ping","data":{}}"#),
            Err(DecodeError::UnknownEvent(_))
        ));
        assert!(matches!(decode("[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("{oops"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_join_frame() {
        let frame = OutboundFrame::Join {
            vehicle_id: VehicleId::from(42),
        };
        assert_eq!(
            frame.to_json().unwrap(),
            r#"{"event":"join","data":{"vehicle_id":"42"}}"#
        );
    }

    #[test]
    fn test_shutdown_response() {
        let resp: ShutdownResponse =
            serde_json::from_str(r#"{"status":"success","message":"Ok","shutdown":true}"#)
                .unwrap();
        assert!(resp.is_success());
        assert!(resp.shutdown);
        assert!(resp.transmit_audio.is_none());
    }
}
