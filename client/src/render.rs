//! Snapshot of everything the map and panels need for one frame.
//!
//! The sink polls [`render`] after each transition; it draws, it never
//! computes.

use shared::{Coordinate, RouteBounds, RouteSegment, RouteSummary};

use crate::assembler::RouteResult;
use crate::locator::nearest_segment;
use crate::risk::{MarkerColor, SeverityTier, classify};
use crate::trip::{Panel, ViewState};
use crate::units::{format_distance, format_duration};
use crate::waypoints::Waypoint;

pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 39.96,
    lon: -75.6,
};
pub const DEFAULT_ZOOM: u8 = 12;
pub const FOCUS_ZOOM: u8 = 15;

#[derive(Debug, Clone, PartialEq)]
pub enum Camera {
    Default { center: Coordinate, zoom: u8 },
    FlyTo { center: Coordinate, zoom: u8 },
    FitBounds(RouteBounds),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    Source,
    /// Slot index in the stop list, placeholders included.
    Stop(usize),
    Destination,
    Selected,
}

impl MarkerRole {
    pub fn label(&self) -> String {
        match self {
            MarkerRole::Source => "Source".to_string(),
            MarkerRole::Stop(index) => format!("Stop {}", index + 1),
            MarkerRole::Destination => "Destination".to_string(),
            MarkerRole::Selected => "Selected".to_string(),
        }
    }
}

/// Risk reading shown in a popup, from a nearest segment or a point lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInfo {
    pub hori: i32,
    pub tier: SeverityTier,
    pub temp_c: f64,
    pub aqi: i32,
    pub reason: String,
    pub ts: Option<String>,
}

impl From<&RouteSegment> for RiskInfo {
    fn from(segment: &RouteSegment) -> Self {
        Self {
            hori: segment.hori,
            tier: classify(segment.hori),
            temp_c: segment.temp_c,
            aqi: segment.aqi,
            reason: segment.reason.clone(),
            ts: Some(segment.ts.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub place_name: String,
    pub risk: Option<RiskInfo>,
    /// Offer the "Get Directions" action.
    pub directions: bool,
}

impl Popup {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone(), self.place_name.clone()];
        if let Some(risk) = &self.risk {
            lines.push(format!("HORI: {} ({})", risk.hori, risk.tier.as_str()));
            lines.push(format!("Temp: {} °C", risk.temp_c));
            lines.push(format!("AQI: {}", risk.aqi));
            lines.push(format!("Reason: {}", risk.reason));
            if let Some(ts) = &risk.ts {
                lines.push(format!("Time: {ts}"));
            }
        }
        if self.directions {
            lines.push("[Get Directions]".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub role: MarkerRole,
    pub position: Coordinate,
    pub color: MarkerColor,
    pub popup: Popup,
}

/// Review panel header.
#[derive(Debug, Clone, PartialEq)]
pub struct TripSummary {
    pub distance: String,
    pub duration: String,
    pub risk: Option<RouteSummary>,
    pub depart_iso: Option<String>,
    pub arrive_iso: Option<String>,
}

impl From<&RouteResult> for TripSummary {
    fn from(route: &RouteResult) -> Self {
        Self {
            distance: format_distance(Some(route.distance_km)),
            duration: format_duration(Some(route.duration_min)),
            risk: route.summary.clone(),
            depart_iso: route.depart_iso.clone(),
            arrive_iso: route.arrive_iso.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub panel: Panel,
    pub path: Option<Vec<Coordinate>>,
    pub markers: Vec<Marker>,
    pub camera: Camera,
    pub summary: Option<TripSummary>,
    pub error: Option<String>,
}

pub fn render(state: &ViewState, error: Option<&str>) -> RenderFrame {
    let (path, markers, summary) = match state {
        ViewState::Search { selected } => {
            let markers = selected.iter().map(selected_marker).collect();
            (None, markers, None)
        }
        ViewState::Directions {
            pending_destination,
        } => {
            let markers = pending_destination
                .iter()
                .map(|d| waypoint_marker(MarkerRole::Destination, d, &[]))
                .collect();
            (None, markers, None)
        }
        ViewState::Review { route } => {
            let path = route.path();
            let path = (!path.is_empty()).then_some(path);
            (path, route_markers(route), Some(TripSummary::from(route)))
        }
    };

    RenderFrame {
        panel: state.panel(),
        camera: camera(state.panel(), path.as_deref(), &markers),
        path,
        markers,
        summary,
        error: error.map(str::to_string),
    }
}

/// Source, filled stops and destination, each annotated with the nearest
/// path segment.
pub fn route_markers(route: &RouteResult) -> Vec<Marker> {
    let segments = &route.segments;
    let mut markers = vec![waypoint_marker(MarkerRole::Source, &route.source, segments)];
    markers.extend(route.stops.iter().enumerate().filter_map(|(index, stop)| {
        stop.as_ref()
            .map(|stop| waypoint_marker(MarkerRole::Stop(index), stop, segments))
    }));
    markers.push(waypoint_marker(
        MarkerRole::Destination,
        &route.destination,
        segments,
    ));
    markers
}

fn waypoint_marker(role: MarkerRole, waypoint: &Waypoint, segments: &[RouteSegment]) -> Marker {
    let color = match role {
        MarkerRole::Source => MarkerColor::Green,
        MarkerRole::Stop(_) => MarkerColor::Orange,
        MarkerRole::Destination => MarkerColor::Red,
        MarkerRole::Selected => selected_color(waypoint),
    };
    Marker {
        role,
        position: waypoint.coordinate(),
        color,
        popup: Popup {
            title: role.label(),
            place_name: waypoint.place_name.clone(),
            risk: nearest_segment(waypoint.coordinate(), segments).map(RiskInfo::from),
            directions: false,
        },
    }
}

fn selected_marker(point: &Waypoint) -> Marker {
    let risk = point.risk.as_ref().map(|risk| RiskInfo {
        hori: risk.hori,
        tier: classify(risk.hori),
        temp_c: risk.temp_c,
        aqi: risk.aqi,
        reason: risk.reason.clone(),
        ts: risk.ts.clone(),
    });
    Marker {
        role: MarkerRole::Selected,
        position: point.coordinate(),
        color: selected_color(point),
        popup: Popup {
            title: point.place_name.clone(),
            place_name: point.place_name.clone(),
            risk,
            directions: true,
        },
    }
}

fn selected_color(point: &Waypoint) -> MarkerColor {
    point
        .risk
        .as_ref()
        .map(|risk| classify(risk.hori).color())
        .unwrap_or(MarkerColor::Green)
}

fn camera(panel: Panel, path: Option<&[Coordinate]>, markers: &[Marker]) -> Camera {
    if let Some(bounds) = path
        .filter(|p| p.len() > 1)
        .and_then(|p| RouteBounds::from_points(p.iter().copied()))
    {
        return Camera::FitBounds(bounds);
    }
    match markers.first() {
        Some(marker) if panel != Panel::Review => Camera::FlyTo {
            center: marker.position,
            zoom: FOCUS_ZOOM,
        },
        _ => Camera::Default {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        },
    }
}
