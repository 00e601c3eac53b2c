use shared::{Coordinate, RouteSegment};

/// Find the segment nearest to `point`, using squared euclidean distance in
/// degree space. Segments are closely spaced along the path, so no geodesic
/// correction is applied. Ties go to the earliest segment.
pub fn nearest_segment(point: Coordinate, segments: &[RouteSegment]) -> Option<&RouteSegment> {
    let mut best: Option<(&RouteSegment, f64)> = None;

    for segment in segments {
        let d = squared_distance(point, segment.coordinate());
        match best {
            Some((_, min)) if d >= min => {}
            _ => best = Some((segment, d)),
        }
    }

    best.map(|(segment, _)| segment)
}

fn squared_distance(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = b.lat - a.lat;
    let dlon = b.lon - a.lon;
    dlat * dlat + dlon * dlon
}
