//! Helicopter landing-zone candidates
//!
//! - Candidates: slope threshold, morphology, vectorization and ranking
//! - Distance transform: inscribed-circle sizing of each candidate
//! - Aircraft: presets resolving to slope and clear-diameter thresholds

mod aircraft;
mod candidates;
mod edt;

pub use aircraft::{resolve_aircraft, AircraftOverrides, AircraftProfile, ResolvedAircraft, PRESETS};
pub use candidates::{
    extract_candidates, search_bounds, CandidateMeta, CandidateParams, CandidateRegion, CandidateResult, Candidates, Center,
    EmptyReason, LandingCenter,
};
pub use edt::distance_transform;
