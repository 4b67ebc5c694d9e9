//! Route clearance evaluation

mod evaluate;

pub use evaluate::{
    evaluate_route, AltitudeMode, ClearanceInput, ClearanceParams, ClearanceResult, ClearanceSummary, Hotspot,
    RouteClearance, RouteSegment, SegmentStatus,
};
