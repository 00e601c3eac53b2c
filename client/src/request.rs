use chrono::{DateTime, SecondsFormat, Utc};
use shared::RouteRequest;

use crate::error::TripError;
use crate::waypoints::{Waypoint, WaypointEditor, resolved};

pub const MISSING_ENDPOINTS: &str = "Please choose both source and destination.";

/// Build the backend request for a route through the given waypoints.
///
/// Coordinates go out as `[lon, lat]`. Placeholder stops are dropped, the
/// remaining ones keep their visit order.
pub fn build_route_request(
    source: Option<&Waypoint>,
    destination: Option<&Waypoint>,
    stops: &[Option<Waypoint>],
    depart: DateTime<Utc>,
) -> Result<RouteRequest, TripError> {
    let (source, destination) = require_endpoints(source, destination)?;
    Ok(route_request(source, destination, stops, depart))
}

/// Request body for endpoints that are already known to be set.
pub fn route_request(
    source: &Waypoint,
    destination: &Waypoint,
    stops: &[Option<Waypoint>],
    depart: DateTime<Utc>,
) -> RouteRequest {
    let stops = resolved(stops);
    RouteRequest {
        src: source.coordinate().to_lon_lat(),
        dst: destination.coordinate().to_lon_lat(),
        stops: stops.iter().map(|s| s.coordinate().to_lon_lat()).collect(),
        depart_iso: depart.to_rfc3339_opts(SecondsFormat::Millis, true),
        src_name: Some(source.place_name.clone()),
        dst_name: Some(destination.place_name.clone()),
        stop_names: Some(stops.iter().map(|s| s.place_name.clone()).collect()),
    }
}

fn require_endpoints<'a>(
    source: Option<&'a Waypoint>,
    destination: Option<&'a Waypoint>,
) -> Result<(&'a Waypoint, &'a Waypoint), TripError> {
    match (source, destination) {
        (Some(source), Some(destination)) => Ok((source, destination)),
        _ => Err(TripError::Validation(MISSING_ENDPOINTS.to_string())),
    }
}

impl WaypointEditor {
    /// Source and destination, or the validation error shown when either is
    /// missing.
    pub fn endpoints(&self) -> Result<(&Waypoint, &Waypoint), TripError> {
        require_endpoints(self.source(), self.destination())
    }

    pub fn to_request(&self, depart: DateTime<Utc>) -> Result<RouteRequest, TripError> {
        build_route_request(self.source(), self.destination(), self.stops(), depart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn depart() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn coordinates_are_lon_lat_and_placeholders_filtered() {
        let source = Waypoint::new("S", 10.0, 20.0);
        let destination = Waypoint::new("D", 30.0, 40.0);
        let stops = vec![None, Some(Waypoint::new("X", 1.0, 2.0))];

        let req = build_route_request(Some(&source), Some(&destination), &stops, depart()).unwrap();
        assert_eq!(req.src, [20.0, 10.0]);
        assert_eq!(req.dst, [40.0, 30.0]);
        assert_eq!(req.stops, vec![[2.0, 1.0]]);
        assert_eq!(req.stop_names, Some(vec!["X".to_string()]));
        assert_eq!(req.depart_iso, "2025-06-01T08:30:00.000Z");
    }

    #[test]
    fn missing_source_is_rejected() {
        let destination = Waypoint::new("D", 30.0, 40.0);
        let err = build_route_request(None, Some(&destination), &[], depart()).unwrap_err();
        assert!(matches!(err, TripError::Validation(ref msg) if msg == MISSING_ENDPOINTS));
    }

    #[test]
    fn missing_destination_is_rejected() {
        let source = Waypoint::new("S", 10.0, 20.0);
        assert!(build_route_request(Some(&source), None, &[], depart()).is_err());
    }

    #[test]
    fn stop_order_is_preserved() {
        let mut editor = WaypointEditor::new();
        editor.set_source(Waypoint::new("S", 0.0, 0.0));
        editor.set_destination(Waypoint::new("D", 9.0, 9.0));
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            editor.add_stop_slot();
            editor
                .set_stop(i, Waypoint::new(*name, i as f64, i as f64 + 0.5))
                .unwrap();
        }
        let req = editor.to_request(depart()).unwrap();
        assert_eq!(req.stops, vec![[0.5, 0.0], [1.5, 1.0], [2.5, 2.0]]);
    }

    #[test]
    fn editor_endpoints_need_both_ends() {
        let mut editor = WaypointEditor::new();
        editor.set_destination(Waypoint::new("D", 9.0, 9.0));
        assert!(matches!(editor.endpoints(), Err(TripError::Validation(_))));
        editor.set_source(Waypoint::new("S", 0.0, 0.0));
        let (source, destination) = editor.endpoints().unwrap();
        assert_eq!((source.place_name.as_str(), destination.place_name.as_str()), ("S", "D"));
    }
}
