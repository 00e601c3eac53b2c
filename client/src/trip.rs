//! Interaction modes and the transitions between them.
//!
//! Each transition produces a new [`ViewState`] snapshot; nothing is mutated
//! in place. Exactly one mode is active at any time.

use crate::assembler::RouteResult;
use crate::error::TripError;
use crate::waypoints::Waypoint;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Search { selected: Option<Waypoint> },
    Directions { pending_destination: Option<Waypoint> },
    Review { route: RouteResult },
}

/// Which panel the rendering sink should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Search,
    Directions,
    Review,
}

#[derive(Debug, Clone)]
pub enum TripEvent {
    Select(Waypoint),
    RequestDirections(Waypoint),
    Back,
    RouteComputed(RouteResult),
    RouteUpdated(RouteResult),
}

impl TripEvent {
    fn name(&self) -> &'static str {
        match self {
            TripEvent::Select(_) => "select",
            TripEvent::RequestDirections(_) => "request_directions",
            TripEvent::Back => "back",
            TripEvent::RouteComputed(_) => "route_computed",
            TripEvent::RouteUpdated(_) => "route_updated",
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Search { selected: None }
    }
}

impl ViewState {
    pub fn panel(&self) -> Panel {
        match self {
            ViewState::Search { .. } => Panel::Search,
            ViewState::Directions { .. } => Panel::Directions,
            ViewState::Review { .. } => Panel::Review,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self.panel() {
            Panel::Search => "search",
            Panel::Directions => "directions",
            Panel::Review => "review",
        }
    }

    pub fn selected(&self) -> Option<&Waypoint> {
        match self {
            ViewState::Search { selected } => selected.as_ref(),
            _ => None,
        }
    }

    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            ViewState::Review { route } => Some(route),
            _ => None,
        }
    }

    /// Compute the state that follows `event`. Events that make no sense in
    /// the current mode are rejected and leave the caller's state untouched.
    ///
    /// Leaving review drops the route: review is only entered again through a
    /// fresh `RouteComputed`.
    pub fn next(&self, event: TripEvent) -> Result<ViewState, TripError> {
        let unexpected = |event: &TripEvent| TripError::UnexpectedEvent {
            state: self.name(),
            event: event.name(),
        };

        match (self, event) {
            (ViewState::Search { .. }, TripEvent::Select(point)) => Ok(ViewState::Search {
                selected: Some(point),
            }),
            (ViewState::Search { .. }, TripEvent::RequestDirections(destination)) => {
                Ok(ViewState::Directions {
                    pending_destination: Some(destination),
                })
            }
            (ViewState::Directions { .. } | ViewState::Review { .. }, TripEvent::Back) => {
                Ok(ViewState::Search { selected: None })
            }
            (ViewState::Directions { .. }, TripEvent::RouteComputed(route)) => {
                Ok(ViewState::Review { route })
            }
            (ViewState::Review { .. }, TripEvent::RouteUpdated(route)) => {
                Ok(ViewState::Review { route })
            }
            (_, event) => Err(unexpected(&event)),
        }
    }
}

/// Owns the active mode for one session.
#[derive(Debug, Default)]
pub struct TripViewStateMachine {
    state: ViewState,
}

impl TripViewStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn dispatch(&mut self, event: TripEvent) -> Result<&ViewState, TripError> {
        let from = self.state.name();
        let event_name = event.name();
        self.state = self.state.next(event)?;
        tracing::info!("trip view {from} --{event_name}--> {}", self.state.name());
        Ok(&self.state)
    }
}
