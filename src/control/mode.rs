//! Control strategy selection.
//!
//! One [`ControlMode`] is shared by both controlled variables (the
//! heater and pump loops always run the same strategy). The transition
//! side-effects — resetting all PID accumulator state — live in
//! [`ControlService`](crate::app::service::ControlService), which owns
//! the engines.

use serde::{Deserialize, Serialize};

/// Active control strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Membership-function fuzzy inference.
    Fuzzy,
    /// PID with anti-windup (plus gain scheduling on the pump loop).
    #[serde(rename = "PID")]
    Pid,
}

impl ControlMode {
    /// Wire label, matching the command/telemetry channel vocabulary.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fuzzy => "Fuzzy",
            Self::Pid => "PID",
        }
    }

    /// Strict parse of a wire label. Anything unrecognized yields
    /// `None` and the caller retains its current mode.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Fuzzy" => Some(Self::Fuzzy),
            "PID" => Some(Self::Pid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_exact_labels_only() {
        assert_eq!(ControlMode::parse("Fuzzy"), Some(ControlMode::Fuzzy));
        assert_eq!(ControlMode::parse("PID"), Some(ControlMode::Pid));
        assert_eq!(ControlMode::parse("fuzzy"), None);
        assert_eq!(ControlMode::parse("pid"), None);
        assert_eq!(ControlMode::parse("BANG_BANG"), None);
        assert_eq!(ControlMode::parse(""), None);
    }

    #[test]
    fn label_roundtrips_through_parse() {
        for m in [ControlMode::Fuzzy, ControlMode::Pid] {
            assert_eq!(ControlMode::parse(m.label()), Some(m));
        }
    }

    #[test]
    fn serde_uses_wire_labels() {
        assert_eq!(
            serde_json::to_string(&ControlMode::Pid).unwrap(),
            "\"PID\""
        );
        assert_eq!(
            serde_json::to_string(&ControlMode::Fuzzy).unwrap(),
            "\"Fuzzy\""
        );
    }
}
