//! Scoring rules: delivery legality, strike rotation, over and innings
//! completion, display tokens and delivery validation.
//!
//! Everything here is a pure function of its arguments.

use crate::errors::{AppError, Result};
use crate::models::innings::{Ball, Delivery, ExtrasType, WicketType, BALLS_PER_OVER, MAX_WICKETS};

pub const MAX_RUNS_OFF_BAT: u32 = 10;
pub const MAX_WIDE_EXTRAS: u32 = 5;
pub const MAX_NO_BALL_EXTRAS: u32 = 5;
pub const MAX_BYE_EXTRAS: u32 = 6;

pub const DOT_BALL_MARKER: &str = "•";

pub fn is_legal_delivery(extras_type: ExtrasType) -> bool {
    !matches!(extras_type, ExtrasType::Wide | ExtrasType::NoBall)
}

pub fn total_runs(runs_off_bat: u32, extras_runs: u32) -> u32 {
    runs_off_bat + extras_runs
}

/// Whether the batters finish the delivery at opposite ends.
pub fn should_rotate_strike(runs_off_bat: u32, extras_type: ExtrasType, extras_runs: u32) -> bool {
    match extras_type {
        ExtrasType::Wide => false,
        ExtrasType::NoBall => (runs_off_bat + extras_runs) % 2 == 1,
        ExtrasType::Bye | ExtrasType::LegBye => extras_runs % 2 == 1,
        ExtrasType::None => runs_off_bat % 2 == 1,
    }
}

/// Cricket overs notation: completed overs, then balls of the current over.
/// 17 legal balls is "2.5", not 2.83.
pub fn overs_as_decimal(legal_balls: u32) -> String {
    let overs = legal_balls / BALLS_PER_OVER;
    let balls = legal_balls % BALLS_PER_OVER;
    if balls == 0 {
        overs.to_string()
    } else {
        format!("{}.{}", overs, balls)
    }
}

pub fn innings_should_end(legal_balls: u32, wickets: u32, overs_per_innings: u32) -> bool {
    legal_balls >= overs_per_innings * BALLS_PER_OVER || wickets >= MAX_WICKETS
}

pub fn ball_display_token(
    runs_off_bat: u32,
    extras_type: ExtrasType,
    extras_runs: u32,
    wicket_type: WicketType,
) -> String {
    let total = total_runs(runs_off_bat, extras_runs);

    if wicket_type.is_wicket() {
        return if total == 0 { "W".to_string() } else { format!("{}W", total) };
    }

    match extras_type {
        ExtrasType::Wide if total == 0 => "wd".to_string(),
        ExtrasType::Wide => format!("{}wd", total),
        ExtrasType::NoBall if total == 0 => "nb".to_string(),
        ExtrasType::NoBall => format!("{}nb", total),
        ExtrasType::Bye => format!("{}b", extras_runs),
        ExtrasType::LegBye => format!("{}lb", extras_runs),
        ExtrasType::None if runs_off_bat == 0 => DOT_BALL_MARKER.to_string(),
        ExtrasType::None => runs_off_bat.to_string(),
    }
}

/// Rejects malformed deliveries before anything touches the innings.
pub fn validate_delivery(delivery: &Delivery) -> Result<()> {
    if delivery.striker_id.is_empty() || delivery.non_striker_id.is_empty() {
        return Err(AppError::invalid_data("striker and non-striker are required"));
    }
    if delivery.striker_id == delivery.non_striker_id {
        return Err(AppError::invalid_data("striker and non-striker must be different players"));
    }
    if delivery.runs_off_bat > MAX_RUNS_OFF_BAT {
        return Err(AppError::invalid_data(format!(
            "runs off the bat must be between 0 and {}",
            MAX_RUNS_OFF_BAT
        )));
    }

    let (min_extras, max_extras) = match delivery.extras_type {
        ExtrasType::None => (0, 0),
        ExtrasType::Wide => (0, MAX_WIDE_EXTRAS),
        ExtrasType::NoBall => (0, MAX_NO_BALL_EXTRAS),
        ExtrasType::Bye | ExtrasType::LegBye => (1, MAX_BYE_EXTRAS),
    };
    if delivery.extras_runs < min_extras || delivery.extras_runs > max_extras {
        return Err(AppError::invalid_data(format!(
            "{:?} extras must be between {} and {}",
            delivery.extras_type, min_extras, max_extras
        )));
    }

    if delivery.extras_type == ExtrasType::Wide && delivery.runs_off_bat > 0 {
        return Err(AppError::invalid_data("a wide cannot have runs off the bat"));
    }

    if delivery.wicket_type.is_wicket() {
        let dismissed = match delivery.dismissed_player_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(AppError::invalid_data("a wicket requires the dismissed player")),
        };
        if dismissed != delivery.striker_id && dismissed != delivery.non_striker_id {
            return Err(AppError::invalid_data("the dismissed player must be one of the batters"));
        }
        if dismissed == delivery.non_striker_id && delivery.wicket_type != WicketType::RunOut {
            return Err(AppError::invalid_data("only a run out can dismiss the non-striker"));
        }
    } else if delivery.dismissed_player_id.as_deref().is_some_and(|id| !id.is_empty()) {
        return Err(AppError::invalid_data("a dismissed player was given without a wicket"));
    }

    Ok(())
}

/// The delivery after an un-dismissed no-ball is a free hit.
pub fn is_free_hit(last_delivery: Option<&Ball>) -> bool {
    last_delivery.is_some_and(|ball| {
        ball.extras_type == ExtrasType::NoBall && !ball.wicket_type.is_wicket()
    })
}

pub fn wicket_allowed_on_free_hit(wicket_type: WicketType) -> bool {
    matches!(wicket_type, WicketType::None | WicketType::RunOut)
}

pub fn strike_rate(runs: u32, balls: u32) -> Option<f64> {
    (balls > 0).then(|| runs as f64 * 100.0 / balls as f64)
}

pub fn economy(runs: u32, legal_balls: u32) -> Option<f64> {
    (legal_balls > 0).then(|| runs as f64 * BALLS_PER_OVER as f64 / legal_balls as f64)
}

pub fn run_rate(total_runs: u32, balls_bowled: u32) -> Option<f64> {
    economy(total_runs, balls_bowled)
}

pub fn required_run_rate(runs_needed: u32, balls_remaining: u32) -> Option<f64> {
    economy(runs_needed, balls_remaining)
}

pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{:.2}", value),
        None => "-".to_string(),
    }
}
