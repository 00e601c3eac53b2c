//! Display formatting for route distance and duration.

pub const KM_TO_MILES: f64 = 0.621371;

/// Shown instead of a value that is missing; never rendered as zero.
pub const UNKNOWN: &str = "—";

pub fn km_to_miles(km: f64) -> f64 {
    km * KM_TO_MILES
}

/// Split a duration into whole hours and minutes.
///
/// The total is rounded to the nearest minute (halves away from zero) before
/// splitting, so a remainder that rounds up to 60 carries into the hour and
/// minutes always fall in `0..=59`. `None` for negative or non-finite input.
pub fn minutes_to_hm(minutes: f64) -> Option<(u64, u64)> {
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    let total = minutes.round() as u64;
    Some((total / 60, total % 60))
}

pub fn format_distance(km: Option<f64>) -> String {
    match km {
        Some(km) if km.is_finite() => format!("{:.2} miles", km_to_miles(km)),
        _ => UNKNOWN.to_string(),
    }
}

pub fn format_duration(minutes: Option<f64>) -> String {
    match minutes.and_then(minutes_to_hm) {
        Some((hours, mins)) => format!("{hours} hr {mins} min"),
        None => UNKNOWN.to_string(),
    }
}
