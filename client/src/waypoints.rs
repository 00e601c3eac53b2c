use serde::{Deserialize, Serialize};
use shared::{AddressCandidate, Coordinate, PointRisk};

use crate::error::TripError;

/// A named place chosen by the user. Replaced wholesale on edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub place_name: String,
    pub lat: f64,
    pub lon: f64,
    /// Present when the waypoint is a selected point with a fetched HORI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<PointRisk>,
}

impl Waypoint {
    pub fn new(place_name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            place_name: place_name.into(),
            lat,
            lon,
            risk: None,
        }
    }

    /// Parse a geocoder hit; its coordinates arrive as text.
    pub fn from_candidate(candidate: &AddressCandidate) -> Result<Self, TripError> {
        let parse = |raw: &str, label: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    TripError::Decode(format!(
                        "invalid {label} `{raw}` for `{}`",
                        candidate.display_name
                    ))
                })
        };
        Ok(Self::new(
            candidate.display_name.clone(),
            parse(&candidate.lat, "lat")?,
            parse(&candidate.lon, "lon")?,
        ))
    }

    pub fn with_risk(self, risk: PointRisk) -> Self {
        Self {
            risk: Some(risk),
            ..self
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Source, ordered stops and destination being edited. Stop slots may be
/// empty placeholders waiting for an address; they never reach a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointEditor {
    source: Option<Waypoint>,
    destination: Option<Waypoint>,
    stops: Vec<Option<Waypoint>>,
}

impl WaypointEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(
        source: Option<Waypoint>,
        stops: Vec<Option<Waypoint>>,
        destination: Option<Waypoint>,
    ) -> Self {
        Self {
            source,
            destination,
            stops,
        }
    }

    pub fn source(&self) -> Option<&Waypoint> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&Waypoint> {
        self.destination.as_ref()
    }

    pub fn stops(&self) -> &[Option<Waypoint>] {
        &self.stops
    }

    pub fn set_source(&mut self, waypoint: Waypoint) {
        self.source = Some(waypoint);
    }

    pub fn set_destination(&mut self, waypoint: Waypoint) {
        self.destination = Some(waypoint);
    }

    /// Append an empty stop slot; returns its index.
    pub fn add_stop_slot(&mut self) -> usize {
        self.stops.push(None);
        self.stops.len() - 1
    }

    pub fn set_stop(&mut self, index: usize, waypoint: Waypoint) -> Result<(), TripError> {
        let len = self.stops.len();
        let slot = self
            .stops
            .get_mut(index)
            .ok_or(TripError::Index { index, len })?;
        *slot = Some(waypoint);
        Ok(())
    }

    /// Remove the slot at `index`; later stops shift down by one.
    pub fn remove_stop(&mut self, index: usize) -> Result<Option<Waypoint>, TripError> {
        if index >= self.stops.len() {
            return Err(TripError::Index {
                index,
                len: self.stops.len(),
            });
        }
        Ok(self.stops.remove(index))
    }

    /// Filled stops in visit order, placeholders dropped.
    pub fn resolved_stops(&self) -> Vec<&Waypoint> {
        resolved(&self.stops)
    }
}

pub(crate) fn resolved(stops: &[Option<Waypoint>]) -> Vec<&Waypoint> {
    stops.iter().flatten().collect()
}
