//! Out-of-process collaborators: the HORI backend and the address geocoder.

use std::future::Future;

use reqwest::{Client, Response};
use serde::Deserialize;
use shared::{AddressCandidate, ApiError, PointRisk, RouteRequest, RouteResponse};

use crate::config::ClientConfig;
use crate::error::TripError;
use crate::waypoints::Waypoint;

/// Route and point risk computation.
pub trait HoriBackend: Send + Sync {
    fn compute_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<RouteResponse, TripError>> + Send;

    fn point_risk(
        &self,
        point: &Waypoint,
    ) -> impl Future<Output = Result<PointRisk, TripError>> + Send;
}

/// Free-text address lookup.
pub trait Geocoder: Send + Sync {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<AddressCandidate>, TripError>> + Send;
}

fn http_client(config: &ClientConfig) -> Result<Client, TripError> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|err| TripError::Network(format!("failed to create HTTP client: {err}")))
}

/// Turn a non-success status into a `Network` error, keeping whatever
/// message the server put in the body.
async fn check_status(response: Response) -> Result<Response, TripError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorBody {
        Api(ApiError),
        Detail { detail: serde_json::Value },
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody::Api(err)) => err.message,
        Ok(ErrorBody::Detail { detail }) => match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        },
        Err(_) => body,
    };

    if detail.trim().is_empty() {
        Err(TripError::Network(format!("server returned {status}")))
    } else {
        Err(TripError::Network(format!("server returned {status}: {}", detail.trim())))
    }
}

pub struct HttpHoriBackend {
    client: Client,
    route_url: String,
    point_url: String,
}

impl HttpHoriBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, TripError> {
        Ok(Self {
            client: http_client(config)?,
            route_url: config.route_url(),
            point_url: config.point_url(),
        })
    }
}

impl HoriBackend for HttpHoriBackend {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, TripError> {
        tracing::debug!(
            "sending route request src={:?} dst={:?} stops={} depart={}",
            request.src,
            request.dst,
            request.stops.len(),
            request.depart_iso
        );
        let response = self.client.post(&self.route_url).json(request).send().await?;
        let route = check_status(response).await?.json::<RouteResponse>().await?;
        tracing::debug!(
            "route response segments={} distance_km={:.2} duration_min={:.1}",
            route.segments.len(),
            route.distance_km,
            route.duration_min
        );
        Ok(route)
    }

    async fn point_risk(&self, point: &Waypoint) -> Result<PointRisk, TripError> {
        tracing::debug!(
            "fetching HORI for `{}` lat={:.5} lon={:.5}",
            point.place_name,
            point.lat,
            point.lon
        );
        let response = self
            .client
            .post(&self.point_url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("place_name", point.place_name.clone()),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json::<PointRisk>().await?)
    }
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    url: String,
    limit: usize,
}

impl NominatimGeocoder {
    pub fn new(config: &ClientConfig) -> Result<Self, TripError> {
        Ok(Self {
            client: http_client(config)?,
            url: config.geocoder_url.clone(),
            limit: config.geocoder_limit,
        })
    }
}

impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<AddressCandidate>, TripError> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("format", "json"),
                ("q", query),
                ("addressdetails", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        Ok(check_status(response)
            .await?
            .json::<Vec<AddressCandidate>>()
            .await?)
    }
}
