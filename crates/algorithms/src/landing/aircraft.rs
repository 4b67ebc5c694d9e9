//! Aircraft profiles and threshold resolution
//!
//! A profile turns an airframe into the two thresholds the candidate
//! extractor needs: the steepest acceptable slope and the minimum clear
//! diameter `(rotor + margin) * k`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Airframe dimensions and landing limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AircraftProfile {
    pub code: &'static str,
    pub rotor_diameter_m: f64,
    pub safety_margin_m: f64,
    /// Multiplier applied to rotor plus margin
    pub k: f64,
    pub slope_max_deg: f64,
}

/// Built-in presets
pub const PRESETS: [AircraftProfile; 3] = [
    AircraftProfile {
        code: "EC135",
        rotor_diameter_m: 10.20,
        safety_margin_m: 6.0,
        k: 1.5,
        slope_max_deg: 8.0,
    },
    AircraftProfile {
        code: "UH-1H",
        rotor_diameter_m: 14.63,
        safety_margin_m: 8.0,
        k: 1.6,
        slope_max_deg: 7.0,
    },
    AircraftProfile {
        code: "S70",
        rotor_diameter_m: 16.36,
        safety_margin_m: 10.0,
        k: 1.7,
        slope_max_deg: 6.0,
    },
];

impl AircraftProfile {
    /// Look up a preset by code, ignoring case
    pub fn preset(code: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code.trim()))
            .copied()
    }

    /// `(rotor + margin) * k`
    pub fn min_clear_diameter_m(&self) -> f64 {
        (self.rotor_diameter_m + self.safety_margin_m) * self.k
    }
}

/// Explicit values that take precedence over a preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftOverrides {
    pub rotor_diameter_m: Option<f64>,
    pub safety_margin_m: Option<f64>,
    pub k: Option<f64>,
    pub slope_max_deg: Option<f64>,
}

/// Thresholds after applying overrides, preset and defaults in that order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAircraft {
    pub code: Option<String>,
    pub rotor_diameter_m: f64,
    pub safety_margin_m: f64,
    pub k: f64,
    pub slope_max_deg: f64,
    pub min_clear_diameter_m: f64,
}

/// Resolve extractor thresholds for an airframe.
///
/// Each field takes the explicit override if present, else the preset's
/// value, else the default (rotor 0, margin 0, k 1, `default_slope_deg`).
/// The minimum clear diameter never drops below `user_min_diameter_m`.
/// Unknown codes are logged and treated as no preset.
pub fn resolve_aircraft(
    code: Option<&str>,
    overrides: &AircraftOverrides,
    user_min_diameter_m: f64,
    default_slope_deg: f64,
) -> ResolvedAircraft {
    let preset = code.and_then(|c| {
        let found = AircraftProfile::preset(c);
        if found.is_none() {
            warn!(code = c, "unknown aircraft preset, using defaults");
        }
        found
    });

    let rotor_diameter_m = overrides
        .rotor_diameter_m
        .or(preset.map(|p| p.rotor_diameter_m))
        .unwrap_or(0.0);
    let safety_margin_m = overrides
        .safety_margin_m
        .or(preset.map(|p| p.safety_margin_m))
        .unwrap_or(0.0);
    let k = overrides.k.or(preset.map(|p| p.k)).unwrap_or(1.0);
    let slope_max_deg = overrides
        .slope_max_deg
        .or(preset.map(|p| p.slope_max_deg))
        .unwrap_or(default_slope_deg);

    let auto = (rotor_diameter_m + safety_margin_m) * k;

    ResolvedAircraft {
        code: code.map(str::to_string),
        rotor_diameter_m,
        safety_margin_m,
        k,
        slope_max_deg,
        min_clear_diameter_m: user_min_diameter_m.max(auto),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preset_lookup() {
        let uh1 = AircraftProfile::preset("uh-1h").unwrap();
        assert_eq!(uh1.code, "UH-1H");
        assert_relative_eq!(uh1.min_clear_diameter_m(), (14.63 + 8.0) * 1.6);
        assert!(AircraftProfile::preset("A320").is_none());
    }

    #[test]
    fn test_preset_raises_min_diameter() {
        let r = resolve_aircraft(Some("S70"), &AircraftOverrides::default(), 30.0, 12.0);
        assert_relative_eq!(r.min_clear_diameter_m, (16.36 + 10.0) * 1.7);
        assert_eq!(r.slope_max_deg, 6.0);
    }

    #[test]
    fn test_user_minimum_wins_when_larger() {
        let r = resolve_aircraft(Some("EC135"), &AircraftOverrides::default(), 50.0, 12.0);
        assert_eq!(r.min_clear_diameter_m, 50.0);
    }

    #[test]
    fn test_override_beats_preset() {
        let overrides = AircraftOverrides {
            slope_max_deg: Some(10.0),
            k: Some(1.0),
            ..AircraftOverrides::default()
        };
        let r = resolve_aircraft(Some("EC135"), &overrides, 0.0, 12.0);
        assert_eq!(r.slope_max_deg, 10.0);
        assert_relative_eq!(r.min_clear_diameter_m, 16.2);
    }

    #[test]
    fn test_no_preset_uses_defaults() {
        let r = resolve_aircraft(None, &AircraftOverrides::default(), 30.0, 12.0);
        assert_eq!(r.slope_max_deg, 12.0);
        assert_eq!(r.min_clear_diameter_m, 30.0);
        let unknown = resolve_aircraft(Some("XYZ"), &AircraftOverrides::default(), 30.0, 9.0);
        assert_eq!(unknown.slope_max_deg, 9.0);
    }
}
