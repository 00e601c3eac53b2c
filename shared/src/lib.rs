use serde::{Deserialize, Deserializer, Serialize, de};

/// A `[lon, lat]` pair as the HORI backend expects it. Longitude first.
pub type LonLat = [f64; 2];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn to_lon_lat(self) -> LonLat {
        [self.lon, self.lat]
    }

    pub fn from_lon_lat([lon, lat]: LonLat) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RouteBounds {
    /// Bounding box of a set of points, `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        points.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => RouteBounds {
                    min_lat: c.lat,
                    max_lat: c.lat,
                    min_lon: c.lon,
                    max_lon: c.lon,
                },
                Some(b) => RouteBounds {
                    min_lat: b.min_lat.min(c.lat),
                    max_lat: b.max_lat.max(c.lat),
                    min_lon: b.min_lon.min(c.lon),
                    max_lon: b.max_lon.max(c.lon),
                },
            })
        })
    }
}

/// Body of `POST /api/hori/route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub src: LonLat,
    pub dst: LonLat,
    #[serde(default)]
    pub stops: Vec<LonLat>,
    pub depart_iso: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_names: Option<Vec<String>>,
}

/// One point along a computed path with its local risk annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub lat: f64,
    pub lon: f64,
    pub hori: i32,
    pub temp_c: f64,
    pub aqi: i32,
    pub reason: String,
    pub ts: String,
}

impl RouteSegment {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub avg_hori: f64,
    pub worst_hori: i32,
    pub worst_idx: usize,
    pub max_aqi: i32,
    pub avg_temp_c: f64,
}

/// Response of `POST /api/hori/route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub segments: Vec<RouteSegment>,
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RouteSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depart_iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrive_iso: Option<String>,
}

/// Response of `POST /api/hori/point`. The backend echoes the stored row, so
/// the timestamp may come back as `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRisk {
    pub hori: i32,
    pub temp_c: f64,
    pub aqi: i32,
    pub reason: String,
    #[serde(default, alias = "created_at")]
    pub ts: Option<String>,
}

/// One geocoder hit. Nominatim sends coordinates as strings, other
/// providers as numbers; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCandidate {
    pub display_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lat: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    match Raw::deserialize(deserializer) {
        Ok(Raw::Text(text)) => Ok(text),
        Ok(Raw::Number(value)) => Ok(value.to_string()),
        Err(_) => Err(de::Error::custom("expected a string or a number")),
    }
}
