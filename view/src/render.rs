//! Text, classes and markup for each status field.
//!
//! Labels match the server-rendered templates, so a freshly rendered page
//! and a live-updated one look identical.

/// A status badge: full class attribute plus label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub class: &'static str,
    pub text: &'static str,
}

/// A toggle button. It shows the action it will perform next, so its look
/// is the opposite of the state it reflects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleLook {
    /// Outline class to drop.
    pub remove: &'static str,
    /// Outline class to add.
    pub add: &'static str,
    pub title: &'static str,
    pub inner_html: String,
}

const BADGE_ON: &str = "badge bg-success";
const BADGE_OFF: &str = "badge bg-danger";

/// Ignition state.
pub fn vehicle_state(vehicle_on: bool) -> Badge {
    if vehicle_on {
        Badge { class: BADGE_ON, text: "Encendido" }
    } else {
        Badge { class: BADGE_OFF, text: "Apagado" }
    }
}

/// Remote power-cut state.
pub fn control_state(shutdown: bool) -> Badge {
    if shutdown {
        Badge { class: BADGE_OFF, text: "Apagado" }
    } else {
        Badge { class: BADGE_ON, text: "Encendido" }
    }
}

/// Audio transmission state.
pub fn audio_state(transmitting: bool) -> Badge {
    if transmitting {
        Badge { class: BADGE_ON, text: "Activada" }
    } else {
        Badge { class: BADGE_OFF, text: "Desactivada" }
    }
}

pub fn audio_toggle(transmitting: bool) -> ToggleLook {
    if transmitting {
        ToggleLook {
            remove: "btn-outline-success",
            add: "btn-outline-danger",
            title: "Desactivar Audio",
            inner_html: r#"<i class="bi bi-volume-mute text-danger me-1"></i> Desactivar Audio"#
                .to_string(),
        }
    } else {
        ToggleLook {
            remove: "btn-outline-danger",
            add: "btn-outline-success",
            title: "Activar Audio",
            inner_html: r#"<i class="bi bi-volume-up text-success me-1"></i> Activar Audio"#
                .to_string(),
        }
    }
}

pub fn shutdown_toggle(shutdown: bool) -> ToggleLook {
    if shutdown {
        ToggleLook {
            remove: "btn-outline-success",
            add: "btn-outline-danger",
            title: "Encender Vehículo",
            inner_html: r#"<i class="bi bi-power text-danger me-1"></i> Encender"#.to_string(),
        }
    } else {
        ToggleLook {
            remove: "btn-outline-danger",
            add: "btn-outline-success",
            title: "Apagar Vehículo",
            inner_html: r#"<i class="bi bi-power text-success me-1"></i> Apagar"#.to_string(),
        }
    }
}

/// `12.5` → `"12.50 km/h"`.
pub fn speed(kmh: f64) -> String {
    format!("{kmh:.2} km/h")
}

/// Coordinate shown on dashboard cards.
pub fn coordinate(v: f64) -> String {
    format!("{v:.6}")
}

/// Toast text after a shutdown command.
pub fn shutdown_notice(shutdown: bool) -> String {
    format!(
        "El vehículo ha sido {}.",
        if shutdown { "apagado" } else { "encendido" }
    )
}

/// Toast text after an audio command.
pub fn audio_notice(transmitting: bool) -> String {
    format!(
        "Transmisión de audio {}.",
        if transmitting { "activada" } else { "desactivada" }
    )
}

/// Fallback for events without `last_updated`: local time as `DD-MM-YYYY HH:MM`.
pub fn now_display() -> String {
    chrono::Local::now().format("%d-%m-%Y %H:%M").to_string()
}

/// Minimal escaping for text placed into markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_format() {
        assert_eq!(speed(0.0), "0.00 km/h");
        assert_eq!(speed(12.346), "12.35 km/h");
        assert_eq!(speed(80.0), "80.00 km/h");
    }

    #[test]
    fn test_toggles_show_next_action() {
        let t = audio_toggle(true);
        assert_eq!(t.add, "btn-outline-danger");
        assert!(t.inner_html.contains("Desactivar"));
        let t = shutdown_toggle(false);
        assert_eq!(t.add, "btn-outline-success");
        assert_eq!(t.title, "Apagar Vehículo");
    }

    #[test]
    fn test_notices() {
        assert_eq!(shutdown_notice(true), "El vehículo ha sido apagado.");
        assert_eq!(audio_notice(false), "Transmisión de audio desactivada.");
    }

    #[test]
    fn test_now_display_shape() {
        let s = now_display();
        assert_eq!(s.len(), 16);
        assert_eq!(&s[2..3], "-");
        assert_eq!(&s[10..11], " ");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>a&b</b>"), "&lt;b&gt;a&amp;b&lt;/b&gt;");
    }
}
