//! Signal-quality buckets for the reception icon and the bar colour.

/// Icon tier (0..=4) for a raw signal value.
pub fn tier(signal: i64) -> u8 {
    match signal {
        i64::MIN..=6 => 0,
        7..=12 => 1,
        13..=18 => 2,
        19..=24 => 3,
        _ => 4,
    }
}

/// Colour class of the signal bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    Low,
    Medium,
    High,
}

impl SignalClass {
    pub fn of(signal: i64) -> Self {
        if signal < 13 {
            Self::Low
        } else if signal < 25 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Markup for the reception icon of a given signal value.
pub fn icon_html(signal: i64) -> String {
    format!(r#"<i class="bi bi-reception-{}"></i>"#, tier(signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        for s in 0..=100 {
            let expected = if s <= 6 {
                0
            } else if s <= 12 {
                1
            } else if s <= 18 {
                2
            } else if s <= 24 {
                3
            } else {
                4
            };
            assert_eq!(tier(s), expected, "signal {s}");
        }
        assert_eq!(tier(6), 0);
        assert_eq!(tier(7), 1);
        assert_eq!(tier(24), 3);
        assert_eq!(tier(25), 4);
        assert_eq!(tier(-5), 0);
    }

    #[test]
    fn test_class_boundaries() {
        for s in 0..=100 {
            let expected = match s {
                0..=12 => SignalClass::Low,
                13..=24 => SignalClass::Medium,
                _ => SignalClass::High,
            };
            assert_eq!(SignalClass::of(s), expected, "signal {s}");
        }
    }

    #[test]
    fn test_icon_html() {
        assert_eq!(icon_html(18), r#"<i class="bi bi-reception-2"></i>"#);
    }
}
