use serde::Serialize;
use shared::{Coordinate, RouteResponse, RouteSegment, RouteSummary};

use crate::waypoints::Waypoint;

/// A computed route together with the waypoints it was requested for.
/// Replaced, never mutated, on every recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub source: Waypoint,
    pub destination: Waypoint,
    /// Stop slots exactly as the user left them, placeholders included.
    pub stops: Vec<Option<Waypoint>>,
    pub segments: Vec<RouteSegment>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub summary: Option<RouteSummary>,
    pub depart_iso: Option<String>,
    pub arrive_iso: Option<String>,
}

impl RouteResult {
    pub fn path(&self) -> Vec<Coordinate> {
        self.segments.iter().map(RouteSegment::coordinate).collect()
    }
}

/// Merge the backend response with the waypoints that produced it. Segment
/// contents are taken as-is.
pub fn assemble_route_result(
    source: Waypoint,
    destination: Waypoint,
    stops: Vec<Option<Waypoint>>,
    response: RouteResponse,
) -> RouteResult {
    RouteResult {
        source,
        destination,
        stops,
        segments: response.segments,
        distance_km: response.distance_km,
        duration_min: response.duration_min,
        summary: response.summary,
        depart_iso: response.depart_iso,
        arrive_iso: response.arrive_iso,
    }
}
