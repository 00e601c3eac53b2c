//! Address suggestions for one input field.
//!
//! Every keystroke gets a sequence number. A lookup result is applied only if
//! its ticket still carries the latest number, so a slow response to an older
//! query can never overwrite the suggestions for what the user typed last.

use shared::AddressCandidate;

use crate::api::Geocoder;
use crate::error::TripError;
use crate::waypoints::Waypoint;

/// Queries shorter than this never reach the geocoder.
pub const MIN_QUERY_LEN: usize = 3;

/// Hands out sequence numbers to every field of a session. A field rebuilt
/// from scratch starts above any number an older ticket could carry.
#[derive(Debug, Default)]
pub struct SeqCounter(u64);

impl SeqCounter {
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// Handle for one issued lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    seq: u64,
    query: String,
}

impl LookupTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressLookup {
    query: String,
    latest_seq: u64,
    suggestions: Vec<Waypoint>,
}

impl AddressLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input field showing an already chosen place. Tickets numbered `seq`
    /// or lower are stale for it.
    pub fn with_value(waypoint: Option<&Waypoint>, seq: u64) -> Self {
        Self {
            query: waypoint.map(|w| w.place_name.clone()).unwrap_or_default(),
            latest_seq: seq,
            suggestions: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Waypoint] {
        &self.suggestions
    }

    /// Record new input text. Returns a ticket when a lookup should be
    /// issued; short input clears the suggestions instead.
    pub fn input(&mut self, query: &str) -> Option<LookupTicket> {
        let seq = self.latest_seq + 1;
        self.input_at(query, seq)
    }

    /// Like [`AddressLookup::input`], numbering the ticket with `seq` from a
    /// counter shared with other fields.
    pub fn input_at(&mut self, query: &str, seq: u64) -> Option<LookupTicket> {
        self.query = query.to_string();
        self.latest_seq = seq;

        if query.trim().chars().count() < MIN_QUERY_LEN {
            self.suggestions.clear();
            return None;
        }

        Some(LookupTicket {
            seq: self.latest_seq,
            query: query.trim().to_string(),
        })
    }

    pub fn is_current(&self, ticket: &LookupTicket) -> bool {
        ticket.seq == self.latest_seq && ticket.query == self.query.trim()
    }

    /// Apply a lookup outcome. Stale tickets are ignored and `false` is
    /// returned. A failed lookup degrades to an empty list.
    pub fn apply(
        &mut self,
        ticket: &LookupTicket,
        outcome: Result<Vec<AddressCandidate>, TripError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "dropping stale suggestions for `{}` (seq {} < {})",
                ticket.query,
                ticket.seq,
                self.latest_seq
            );
            return false;
        }

        self.suggestions = match outcome {
            Ok(candidates) => candidates
                .iter()
                .filter_map(|candidate| match Waypoint::from_candidate(candidate) {
                    Ok(waypoint) => Some(waypoint),
                    Err(err) => {
                        tracing::warn!("skipping address candidate: {err}");
                        None
                    }
                })
                .collect(),
            Err(err) => {
                tracing::warn!("address search for `{}` failed: {err}", ticket.query);
                Vec::new()
            }
        };
        true
    }

    /// Pick a suggestion. The field then shows the chosen name and any lookup
    /// still in flight becomes stale.
    pub fn choose(&mut self, index: usize) -> Result<Waypoint, TripError> {
        let seq = self.latest_seq + 1;
        self.choose_at(index, seq)
    }

    pub fn choose_at(&mut self, index: usize, seq: u64) -> Result<Waypoint, TripError> {
        let len = self.suggestions.len();
        let waypoint = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or(TripError::Index { index, len })?;
        self.query = waypoint.place_name.clone();
        self.latest_seq = seq;
        self.suggestions.clear();
        Ok(waypoint)
    }
}

/// Run the geocoder for a ticket. Kept apart from [`AddressLookup`] so the
/// field is not borrowed while the request is in flight.
pub async fn run_lookup<G: Geocoder>(
    geocoder: &G,
    ticket: &LookupTicket,
) -> Result<Vec<AddressCandidate>, TripError> {
    geocoder.search(ticket.query()).await
}
