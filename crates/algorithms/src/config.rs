//! Engine configuration
//!
//! Groups the parameter sets of the three stages so they can be loaded from
//! one JSON document. Missing sections and fields keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tengri_core::{Error, Result};

use crate::clearance::ClearanceParams;
use crate::landing::{resolve_aircraft, AircraftOverrides, CandidateParams, ResolvedAircraft};
use crate::obstacles::ObstacleParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub candidates: CandidateParams,
    pub obstacles: ObstacleParams,
    pub clearance: ClearanceParams,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Other(format!("invalid engine config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Candidate parameters for an airframe.
    ///
    /// The configured slope is the fallback behind explicit overrides and
    /// the preset; the configured minimum diameter is a floor under the
    /// aircraft's clear diameter.
    pub fn candidates_for_aircraft(
        &self,
        code: Option<&str>,
        overrides: &AircraftOverrides,
    ) -> (CandidateParams, ResolvedAircraft) {
        let resolved = resolve_aircraft(
            code,
            overrides,
            self.candidates.min_diameter_m,
            self.candidates.slope_max_deg,
        );
        let params = CandidateParams {
            slope_max_deg: resolved.slope_max_deg,
            min_diameter_m: resolved.min_clear_diameter_m,
            ..self.candidates.clone()
        };
        (params, resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearance::AltitudeMode;
    use crate::landing::AircraftProfile;
    use crate::morphology::Morphology;
    use crate::obstacles::HeightEstimate;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.candidates.window_m, 800.0);
        assert_eq!(config.candidates.slope_max_deg, 12.0);
        assert_eq!(config.candidates.min_diameter_m, 30.0);
        assert_eq!(config.obstacles.min_height_m, 2.0);
        assert_eq!(config.clearance.altitude_mode, AltitudeMode::Agl);
        assert_eq!(config.clearance.altitude_m, 60.0);
        assert_eq!(config.clearance.corridor_width_m, 150.0);
        assert_eq!(config.clearance.min_clearance_m, 30.0);
        assert_eq!(config.clearance.step_m, 25.0);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{
                "candidates": {"morphology": "opening", "window_m": 1200},
                "obstacles": {"height": "per_polygon"},
                "clearance": {"altitude_mode": "MSL"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.candidates.morphology, Morphology::Opening);
        assert_eq!(config.candidates.window_m, 1200.0);
        assert_eq!(config.candidates.slope_max_deg, 12.0);
        assert_eq!(config.obstacles.height, HeightEstimate::PerPolygon);
        assert_eq!(config.clearance.altitude_mode, AltitudeMode::Msl);
        assert_eq!(config.clearance.step_m, 25.0);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(EngineConfig::from_json_str(r#"{"candidates": {"morphology": "dilate"}}"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_aircraft_precedence() {
        let config = EngineConfig::default();
        let (params, _) = config.candidates_for_aircraft(Some("S70"), &AircraftOverrides::default());
        let s70 = AircraftProfile::preset("S70").unwrap();
        assert_eq!(params.slope_max_deg, 6.0);
        assert_eq!(params.min_diameter_m, s70.min_clear_diameter_m());

        let explicit = AircraftOverrides {
            slope_max_deg: Some(9.5),
            ..AircraftOverrides::default()
        };
        let (params, resolved) = config.candidates_for_aircraft(Some("S70"), &explicit);
        assert_eq!(params.slope_max_deg, 9.5);
        assert_eq!(resolved.code.as_deref(), Some("S70"));

        let (params, _) = config.candidates_for_aircraft(None, &AircraftOverrides::default());
        assert_eq!(params.slope_max_deg, 12.0);
        assert_eq!(params.min_diameter_m, 30.0);
    }
}
