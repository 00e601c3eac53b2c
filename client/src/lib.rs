pub mod api;
pub mod assembler;
pub mod config;
pub mod error;
pub mod locator;
pub mod render;
pub mod request;
pub mod risk;
pub mod search;
pub mod session;
pub mod trip;
pub mod units;
pub mod waypoints;

pub use assembler::RouteResult;
pub use error::TripError;
pub use session::{InputField, TripSession};
pub use trip::{Panel, TripEvent, TripViewStateMachine, ViewState};
pub use waypoints::{Waypoint, WaypointEditor};
