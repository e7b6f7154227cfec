//! Angle unit handling for motion parameters.
//!
//! The solver's sinusoidal rotation blocks carry an `anglesunits` attribute
//! and an amplitude whose meaning depends on it, so the unit travels with
//! every sweep value that touches motion.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Accepts the literal choice strings; anything else is rejected so the
    /// prompt layer can fall back to its default.
    pub fn parse(s: &str) -> Option<AngleUnit> {
        match s.trim().to_lowercase().as_str() {
            "degrees" => Some(AngleUnit::Degrees),
            "radians" => Some(AngleUnit::Radians),
            _ => None,
        }
    }

    /// Value written into the `anglesunits` attribute.
    pub fn label(&self) -> &'static str {
        match self {
            AngleUnit::Degrees => "degrees",
            AngleUnit::Radians => "radians",
        }
    }

    /// Short form used in variant directory names.
    pub fn tag_suffix(&self) -> &'static str {
        match self {
            AngleUnit::Degrees => "deg",
            AngleUnit::Radians => "rad",
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Angular velocity ω (rad/s) to frequency f (Hz): f = ω / 2π.
pub fn omega_to_freq(omega: f64) -> f64 {
    omega / (2.0 * std::f64::consts::PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omega_conversion() {
        let f = omega_to_freq(2.0 * std::f64::consts::PI);
        assert!((f - 1.0).abs() < 1e-12, "2π rad/s should be 1 Hz, got {}", f);
    }

    #[test]
    fn parse_choices() {
        assert_eq!(AngleUnit::parse(" Degrees "), Some(AngleUnit::Degrees));
        assert_eq!(AngleUnit::parse("radians"), Some(AngleUnit::Radians));
        assert_eq!(AngleUnit::parse("deg"), None);
        assert_eq!(AngleUnit::parse(""), None);
    }

    #[test]
    fn labels_and_suffixes() {
        assert_eq!(AngleUnit::Degrees.label(), "degrees");
        assert_eq!(AngleUnit::Radians.tag_suffix(), "rad");
        assert_eq!(format!("{}", AngleUnit::Degrees), "degrees");
    }
}
