//! One user session: the active mode, the waypoints being edited, the address
//! fields and the last user-facing error, all in one place.
//!
//! Operations run to completion one at a time. Address lookups are split into
//! `type_address` / `run_lookup` / `apply_suggestions` so a slow geocoder call
//! never holds the session.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::api::{Geocoder, HoriBackend};
use crate::assembler::{RouteResult, assemble_route_result};
use crate::error::TripError;
use crate::render::{RenderFrame, render};
use crate::request::route_request;
use crate::search::{AddressLookup, LookupTicket, SeqCounter, run_lookup};
use crate::trip::{Panel, TripEvent, TripViewStateMachine, ViewState};
use crate::waypoints::{Waypoint, WaypointEditor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    Search,
    Source,
    Destination,
    Stop(usize),
}

pub struct TripSession<B, G> {
    backend: B,
    geocoder: G,
    machine: TripViewStateMachine,
    editor: WaypointEditor,
    fields: HashMap<InputField, AddressLookup>,
    /// Shared by all fields so replacing one never reuses a ticket number.
    seq: SeqCounter,
    error: Option<String>,
}

impl<B: HoriBackend, G: Geocoder> TripSession<B, G> {
    pub fn new(backend: B, geocoder: G) -> Self {
        Self {
            backend,
            geocoder,
            machine: TripViewStateMachine::new(),
            editor: WaypointEditor::new(),
            fields: HashMap::new(),
            seq: SeqCounter::default(),
            error: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        self.machine.state()
    }

    pub fn editor(&self) -> &WaypointEditor {
        &self.editor
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn field(&self, field: InputField) -> Option<&AddressLookup> {
        self.fields.get(&field)
    }

    /// Latest snapshot for the rendering sink.
    pub fn frame(&self) -> RenderFrame {
        render(self.state(), self.error())
    }

    /// Record typed text for a field; returns a ticket when a lookup should
    /// be issued.
    pub fn type_address(
        &mut self,
        field: InputField,
        text: &str,
    ) -> Result<Option<LookupTicket>, TripError> {
        self.check_field(field)?;
        let seq = self.seq.next();
        Ok(self.fields.entry(field).or_default().input_at(text, seq))
    }

    /// Apply a finished lookup. Returns `false` when a newer query has
    /// superseded it.
    pub fn apply_suggestions(
        &mut self,
        field: InputField,
        ticket: &LookupTicket,
        outcome: Result<Vec<shared::AddressCandidate>, TripError>,
    ) -> bool {
        match self.fields.get_mut(&field) {
            Some(lookup) => lookup.apply(ticket, outcome),
            None => false,
        }
    }

    /// Type, look up and apply in one go. Suggestions for the field are
    /// returned; a failed lookup yields an empty list.
    pub async fn search_address(
        &mut self,
        field: InputField,
        text: &str,
    ) -> Result<&[Waypoint], TripError> {
        if let Some(ticket) = self.type_address(field, text)? {
            let outcome = run_lookup(&self.geocoder, &ticket).await;
            self.apply_suggestions(field, &ticket, outcome);
        }
        Ok(self
            .fields
            .get(&field)
            .map(AddressLookup::suggestions)
            .unwrap_or_default())
    }

    /// Pick a suggestion. In the search bar this fetches the point's HORI and
    /// selects it; in the editor fields it fills the matching waypoint.
    pub async fn choose_suggestion(
        &mut self,
        field: InputField,
        index: usize,
    ) -> Result<(), TripError> {
        self.check_field(field)?;
        let seq = self.seq.next();
        let waypoint = self
            .fields
            .get_mut(&field)
            .ok_or(TripError::Index { index, len: 0 })?
            .choose_at(index, seq)?;

        match field {
            InputField::Search => self.select_point(waypoint).await,
            InputField::Source => {
                self.editor.set_source(waypoint);
                Ok(())
            }
            InputField::Destination => {
                self.editor.set_destination(waypoint);
                Ok(())
            }
            InputField::Stop(slot) => self.editor.set_stop(slot, waypoint),
        }
    }

    /// Fetch the HORI for a place and make it the selected point.
    pub async fn select_point(&mut self, point: Waypoint) -> Result<(), TripError> {
        if self.state().panel() != Panel::Search {
            return Err(TripError::UnexpectedEvent {
                state: self.state().name(),
                event: "select",
            });
        }
        let risk = match self.backend.point_risk(&point).await {
            Ok(risk) => risk,
            Err(err) => return Err(self.fail(err)),
        };
        tracing::info!(
            "selected `{}` hori={} reason={}",
            point.place_name,
            risk.hori,
            risk.reason
        );
        let dispatched = self
            .machine
            .dispatch(TripEvent::Select(point.with_risk(risk)))
            .map(|_| ());
        if let Err(err) = dispatched {
            return Err(self.fail(err));
        }
        self.error = None;
        Ok(())
    }

    /// Open the directions panel with the selected point as destination.
    pub fn request_directions(&mut self) -> Result<(), TripError> {
        let Some(destination) = self.state().selected().cloned() else {
            return Err(TripError::UnexpectedEvent {
                state: self.state().name(),
                event: "request_directions",
            });
        };
        self.machine
            .dispatch(TripEvent::RequestDirections(destination.clone()))?;
        self.editor = WaypointEditor::seeded(None, Vec::new(), Some(destination));
        self.reset_editor_fields();
        Ok(())
    }

    pub fn set_source(&mut self, waypoint: Waypoint) -> Result<(), TripError> {
        self.check_field(InputField::Source)?;
        let seq = self.seq.next();
        self.fields.insert(
            InputField::Source,
            AddressLookup::with_value(Some(&waypoint), seq),
        );
        self.editor.set_source(waypoint);
        Ok(())
    }

    pub fn set_destination(&mut self, waypoint: Waypoint) -> Result<(), TripError> {
        self.check_field(InputField::Destination)?;
        let seq = self.seq.next();
        self.fields.insert(
            InputField::Destination,
            AddressLookup::with_value(Some(&waypoint), seq),
        );
        self.editor.set_destination(waypoint);
        Ok(())
    }

    pub fn add_stop_slot(&mut self) -> Result<usize, TripError> {
        self.check_editing("add_stop")?;
        let slot = self.editor.add_stop_slot();
        let seq = self.seq.next();
        self.fields
            .insert(InputField::Stop(slot), AddressLookup::with_value(None, seq));
        Ok(slot)
    }

    pub fn set_stop(&mut self, slot: usize, waypoint: Waypoint) -> Result<(), TripError> {
        self.check_editing("set_stop")?;
        self.editor.set_stop(slot, waypoint.clone())?;
        let seq = self.seq.next();
        self.fields.insert(
            InputField::Stop(slot),
            AddressLookup::with_value(Some(&waypoint), seq),
        );
        Ok(())
    }

    pub fn remove_stop(&mut self, slot: usize) -> Result<(), TripError> {
        self.check_editing("remove_stop")?;
        self.editor.remove_stop(slot)?;
        self.reset_stop_fields();
        Ok(())
    }

    /// Compute a route for the edited waypoints. From directions this enters
    /// review; in review the shown route is replaced in place. On failure the
    /// mode is left as it was and the error is kept for display.
    pub async fn submit_route(&mut self, depart: DateTime<Utc>) -> Result<&RouteResult, TripError> {
        let panel = self.check_editing("submit_route")?;

        let endpoints = self
            .editor
            .endpoints()
            .map(|(source, destination)| (source.clone(), destination.clone()));
        let (source, destination) = match endpoints {
            Ok(endpoints) => endpoints,
            Err(err) => return Err(self.fail(err)),
        };
        let request = route_request(&source, &destination, self.editor.stops(), depart);

        let response = match self.backend.compute_route(&request).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        let route = assemble_route_result(
            source,
            destination,
            self.editor.stops().to_vec(),
            response,
        );
        tracing::info!(
            "route ready: {} segment(s), {:.2} km, {:.1} min",
            route.segments.len(),
            route.distance_km,
            route.duration_min
        );

        let event = match panel {
            Panel::Review => TripEvent::RouteUpdated(route),
            _ => TripEvent::RouteComputed(route),
        };
        let dispatched = self.machine.dispatch(event).map(|_| ());
        if let Err(err) = dispatched {
            return Err(self.fail(err));
        }
        self.error = None;
        self.seed_from_review();

        self.state().route().ok_or(TripError::UnexpectedEvent {
            state: self.state().name(),
            event: "submit_route",
        })
    }

    /// Replace the waypoints of the route under review, then recompute.
    pub async fn update_route(
        &mut self,
        waypoints: WaypointEditor,
        depart: DateTime<Utc>,
    ) -> Result<&RouteResult, TripError> {
        if self.state().panel() != Panel::Review {
            return Err(TripError::UnexpectedEvent {
                state: self.state().name(),
                event: "update_route",
            });
        }
        self.editor = waypoints;
        self.reset_editor_fields();
        self.submit_route(depart).await
    }

    /// Return to search. Any route shown in review is dropped.
    pub fn back(&mut self) -> Result<(), TripError> {
        self.machine.dispatch(TripEvent::Back)?;
        self.editor = WaypointEditor::new();
        self.fields.clear();
        self.error = None;
        Ok(())
    }

    fn fail(&mut self, err: TripError) -> TripError {
        match &err {
            TripError::Validation(msg) => tracing::warn!("route request rejected: {msg}"),
            other => tracing::error!("{other}"),
        }
        self.error = Some(err.to_string());
        err
    }

    fn check_editing(&self, event: &'static str) -> Result<Panel, TripError> {
        match self.state().panel() {
            panel @ (Panel::Directions | Panel::Review) => Ok(panel),
            Panel::Search => Err(TripError::UnexpectedEvent {
                state: self.state().name(),
                event,
            }),
        }
    }

    fn check_field(&self, field: InputField) -> Result<(), TripError> {
        match field {
            InputField::Search if self.state().panel() == Panel::Search => Ok(()),
            InputField::Search => Err(TripError::UnexpectedEvent {
                state: self.state().name(),
                event: "search_input",
            }),
            InputField::Stop(slot) => {
                self.check_editing("stop_input")?;
                let len = self.editor.stops().len();
                if slot < len {
                    Ok(())
                } else {
                    Err(TripError::Index { index: slot, len })
                }
            }
            InputField::Source | InputField::Destination => {
                self.check_editing("waypoint_input").map(|_| ())
            }
        }
    }

    fn seed_from_review(&mut self) {
        if let Some(route) = self.machine.state().route() {
            self.editor = WaypointEditor::seeded(
                Some(route.source.clone()),
                route.stops.clone(),
                Some(route.destination.clone()),
            );
        }
        self.reset_editor_fields();
    }

    fn reset_editor_fields(&mut self) {
        self.fields.clear();
        self.fields.insert(
            InputField::Source,
            AddressLookup::with_value(self.editor.source(), self.seq.next()),
        );
        self.fields.insert(
            InputField::Destination,
            AddressLookup::with_value(self.editor.destination(), self.seq.next()),
        );
        self.reset_stop_fields();
    }

    fn reset_stop_fields(&mut self) {
        self.fields
            .retain(|field, _| !matches!(field, InputField::Stop(_)));
        for (slot, stop) in self.editor.stops().iter().enumerate() {
            self.fields.insert(
                InputField::Stop(slot),
                AddressLookup::with_value(stop.as_ref(), self.seq.next()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use shared::{AddressCandidate, PointRisk, RouteRequest, RouteResponse, RouteSegment};

    use super::*;

    #[derive(Default)]
    struct StubBackend {
        fail_route: bool,
        requests: Mutex<Vec<RouteRequest>>,
        points: Mutex<Vec<String>>,
    }

    impl HoriBackend for StubBackend {
        async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, TripError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_route {
                return Err(TripError::Network("server returned 502 Bad Gateway".into()));
            }
            let [lon, lat] = request.src;
            Ok(RouteResponse {
                segments: vec![RouteSegment {
                    lat,
                    lon,
                    hori: 77,
                    temp_c: 26.0,
                    aqi: 45,
                    reason: "heat".into(),
                    ts: request.depart_iso.clone(),
                }],
                distance_km: 10.0 + request.stops.len() as f64,
                duration_min: 125.0,
                summary: None,
                depart_iso: Some(request.depart_iso.clone()),
                arrive_iso: None,
            })
        }

        async fn point_risk(&self, point: &Waypoint) -> Result<PointRisk, TripError> {
            self.points.lock().unwrap().push(point.place_name.clone());
            Ok(PointRisk {
                hori: 91,
                temp_c: 21.0,
                aqi: 12,
                reason: "ok".into(),
                ts: None,
            })
        }
    }

    struct StubGeocoder;

    impl Geocoder for StubGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<AddressCandidate>, TripError> {
            Ok(vec![AddressCandidate {
                display_name: format!("{query}, PA"),
                lat: "39.95".into(),
                lon: "-75.16".into(),
            }])
        }
    }

    fn session() -> TripSession<StubBackend, StubGeocoder> {
        TripSession::new(StubBackend::default(), StubGeocoder)
    }

    fn depart() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    async fn into_directions(session: &mut TripSession<StubBackend, StubGeocoder>) {
        session.search_address(InputField::Search, "Philadelphia").await.unwrap();
        session.choose_suggestion(InputField::Search, 0).await.unwrap();
        session.request_directions().unwrap();
    }

    #[tokio::test]
    async fn choosing_a_search_result_selects_it_with_risk() {
        let mut session = session();
        let suggestions = session.search_address(InputField::Search, "Phil").await.unwrap();
        assert_eq!(suggestions.len(), 1);
        session.choose_suggestion(InputField::Search, 0).await.unwrap();

        let selected = session.state().selected().unwrap();
        assert_eq!(selected.place_name, "Phil, PA");
        assert_eq!(selected.risk.as_ref().unwrap().hori, 91);
    }

    #[tokio::test]
    async fn directions_seed_the_destination() {
        let mut session = session();
        into_directions(&mut session).await;
        assert_eq!(session.state().panel(), Panel::Directions);
        assert_eq!(
            session.editor().destination().unwrap().place_name,
            "Philadelphia, PA"
        );
        assert_eq!(
            session.field(InputField::Destination).unwrap().query(),
            "Philadelphia, PA"
        );
        assert!(session.editor().source().is_none());
    }

    #[tokio::test]
    async fn missing_source_blocks_the_network_call() {
        let mut session = session();
        into_directions(&mut session).await;
        let err = session.submit_route(depart()).await.unwrap_err();
        assert!(matches!(err, TripError::Validation(_)));
        assert!(session.backend.requests.lock().unwrap().is_empty());
        assert_eq!(session.state().panel(), Panel::Directions);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn computed_route_enters_review_and_keeps_placeholders() {
        let mut session = session();
        into_directions(&mut session).await;
        session.set_source(Waypoint::new("Home", 40.0, -75.3)).unwrap();
        session.add_stop_slot().unwrap();
        session.add_stop_slot().unwrap();
        session.set_stop(1, Waypoint::new("Cafe", 39.97, -75.2)).unwrap();

        let route = session.submit_route(depart()).await.unwrap();
        assert_eq!(route.stops.len(), 2);
        assert!(route.stops[0].is_none());
        assert_eq!(route.distance_km, 11.0);

        let sent = session.backend.requests.lock().unwrap().clone();
        assert_eq!(sent[0].src, [-75.3, 40.0]);
        assert_eq!(sent[0].stops, vec![[-75.2, 39.97]]);

        let frame = session.frame();
        assert_eq!(frame.panel, Panel::Review);
        assert_eq!(frame.summary.unwrap().duration, "2 hr 5 min");
        assert_eq!(session.editor().stops().len(), 2);
    }

    #[tokio::test]
    async fn editing_in_review_replaces_the_route() {
        let mut session = session();
        into_directions(&mut session).await;
        session.set_source(Waypoint::new("Home", 40.0, -75.3)).unwrap();
        session.submit_route(depart()).await.unwrap();

        session.add_stop_slot().unwrap();
        session.set_stop(0, Waypoint::new("Park", 39.99, -75.18)).unwrap();
        let route = session.submit_route(depart()).await.unwrap();
        assert_eq!(route.distance_km, 11.0);
        assert_eq!(session.state().panel(), Panel::Review);

        session.remove_stop(0).unwrap();
        let mut edits = session.editor().clone();
        edits.set_source(Waypoint::new("Office", 39.9, -75.1));
        let route = session.update_route(edits, depart()).await.unwrap();
        assert_eq!(route.source.place_name, "Office");
        assert_eq!(route.distance_km, 10.0);
    }

    #[tokio::test]
    async fn failed_route_stays_in_directions() {
        let mut session = TripSession::new(
            StubBackend {
                fail_route: true,
                ..StubBackend::default()
            },
            StubGeocoder,
        );
        session.search_address(InputField::Search, "Philadelphia").await.unwrap();
        session.choose_suggestion(InputField::Search, 0).await.unwrap();
        session.request_directions().unwrap();
        session.set_source(Waypoint::new("Home", 40.0, -75.3)).unwrap();

        let err = session.submit_route(depart()).await.unwrap_err();
        assert!(matches!(err, TripError::Network(_)));
        assert_eq!(session.state().panel(), Panel::Directions);
        assert!(session.state().route().is_none());
        assert!(session.frame().error.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn back_from_review_discards_the_route() {
        let mut session = session();
        into_directions(&mut session).await;
        session.set_source(Waypoint::new("Home", 40.0, -75.3)).unwrap();
        session.submit_route(depart()).await.unwrap();

        session.back().unwrap();
        assert_eq!(session.state(), &ViewState::Search { selected: None });
        assert!(session.frame().markers.is_empty());
        assert!(matches!(
            session.submit_route(depart()).await,
            Err(TripError::UnexpectedEvent { .. })
        ));
    }

    #[tokio::test]
    async fn stale_lookup_does_not_overwrite_newer_one() {
        let mut session = session();
        session.request_directions().unwrap_err();
        into_directions(&mut session).await;

        let slow = session.type_address(InputField::Source, "Phil").unwrap().unwrap();
        let fast = session.type_address(InputField::Source, "Pitt").unwrap().unwrap();
        let fast_result = run_lookup(session.geocoder(), &fast).await;
        let slow_result = run_lookup(session.geocoder(), &slow).await;

        assert!(session.apply_suggestions(InputField::Source, &fast, fast_result));
        assert!(!session.apply_suggestions(InputField::Source, &slow, slow_result));
        let field = session.field(InputField::Source).unwrap();
        assert_eq!(field.suggestions()[0].place_name, "Pitt, PA");
    }

    #[tokio::test]
    async fn stop_fields_follow_removal() {
        let mut session = session();
        into_directions(&mut session).await;
        session.add_stop_slot().unwrap();
        session.add_stop_slot().unwrap();
        session.set_stop(1, Waypoint::new("W", 1.0, 1.0)).unwrap();
        session.remove_stop(0).unwrap();

        assert_eq!(session.field(InputField::Stop(0)).unwrap().query(), "W");
        assert!(session.field(InputField::Stop(1)).is_none());
        assert!(matches!(
            session.remove_stop(4),
            Err(TripError::Index { index: 4, len: 1 })
        ));
        assert!(matches!(
            session.type_address(InputField::Stop(3), "abc"),
            Err(TripError::Index { .. })
        ));
    }

    #[tokio::test]
    async fn setting_a_waypoint_keeps_older_lookups_stale() {
        let mut session = session();
        into_directions(&mut session).await;

        let before = session.type_address(InputField::Source, "Phil").unwrap().unwrap();
        session.set_source(Waypoint::new("Home", 40.0, -75.3)).unwrap();
        let after = session.type_address(InputField::Source, "Pitt").unwrap().unwrap();
        assert_ne!(before.seq(), after.seq());

        let stale = run_lookup(session.geocoder(), &before).await;
        assert!(!session.apply_suggestions(InputField::Source, &before, stale));
        assert!(session.field(InputField::Source).unwrap().suggestions().is_empty());

        let fresh = run_lookup(session.geocoder(), &after).await;
        assert!(session.apply_suggestions(InputField::Source, &after, fresh));
        let field = session.field(InputField::Source).unwrap();
        assert_eq!(field.query(), "Pitt");
        assert_eq!(field.suggestions()[0].place_name, "Pitt, PA");
    }

    #[tokio::test]
    async fn removed_stop_lookup_cannot_fill_the_shifted_slot() {
        let mut session = session();
        into_directions(&mut session).await;
        session.add_stop_slot().unwrap();
        session.add_stop_slot().unwrap();

        let removed = session.type_address(InputField::Stop(0), "Old Mill").unwrap().unwrap();
        session.remove_stop(0).unwrap();
        let current = session.type_address(InputField::Stop(0), "Bakery").unwrap().unwrap();

        let stale = run_lookup(session.geocoder(), &removed).await;
        assert!(!session.apply_suggestions(InputField::Stop(0), &removed, stale));
        assert!(session.field(InputField::Stop(0)).unwrap().suggestions().is_empty());

        let fresh = run_lookup(session.geocoder(), &current).await;
        assert!(session.apply_suggestions(InputField::Stop(0), &current, fresh));
        let field = session.field(InputField::Stop(0)).unwrap();
        assert_eq!(field.suggestions()[0].place_name, "Bakery, PA");
    }

    #[tokio::test]
    async fn selecting_outside_search_sends_nothing() {
        let mut session = session();
        into_directions(&mut session).await;
        assert_eq!(session.backend.points.lock().unwrap().len(), 1);

        let err = session
            .select_point(Waypoint::new("Elsewhere", 40.1, -75.4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TripError::UnexpectedEvent { state: "directions", event: "select" }
        ));
        assert_eq!(session.backend.points.lock().unwrap().len(), 1);
        assert_eq!(session.state().panel(), Panel::Directions);
    }

    #[tokio::test]
    async fn update_route_requires_review() {
        let mut session = session();
        into_directions(&mut session).await;
        let mut edits = session.editor().clone();
        edits.set_source(Waypoint::new("Home", 40.0, -75.3));

        let err = session.update_route(edits, depart()).await.unwrap_err();
        assert!(matches!(
            err,
            TripError::UnexpectedEvent { state: "directions", event: "update_route" }
        ));
        assert!(session.backend.requests.lock().unwrap().is_empty());
        assert_eq!(session.state().panel(), Panel::Directions);
        assert!(session.editor().source().is_none());
    }
}
