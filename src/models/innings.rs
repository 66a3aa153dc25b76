use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::cricket_match::Side;
use crate::services::rules;

pub const BALLS_PER_OVER: u32 = 6;
pub const MAX_WICKETS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExtrasType {
    #[default]
    None,
    Wide,
    NoBall,
    Bye,
    LegBye,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WicketType {
    #[default]
    None,
    Bowled,
    #[serde(rename = "LBW")]
    Lbw,
    Caught,
    Stumps,
    RunOut,
    HitWicket,
}

impl WicketType {
    pub fn is_wicket(self) -> bool {
        self != WicketType::None
    }

    /// Run outs are not credited to the bowler.
    pub fn credited_to_bowler(self) -> bool {
        !matches!(self, WicketType::None | WicketType::RunOut)
    }
}

/// One delivery as entered by the scorer, before it is placed in an over.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delivery {
    pub striker_id: String,
    pub non_striker_id: String,
    pub runs_off_bat: u32,
    #[serde(default)]
    pub extras_type: ExtrasType,
    #[serde(default)]
    pub extras_runs: u32,
    #[serde(default)]
    pub wicket_type: WicketType,
    #[serde(default)]
    pub dismissed_player_id: Option<String>,
    #[serde(default)]
    pub fielder_id: Option<String>,
    #[serde(default)]
    pub keeper_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: String,

    // Ordinal among every delivery of the innings, legal or not
    pub sequence: u32,

    // Ordinal among legal deliveries of the segment; extras repeat the number
    pub ball_number: u32,

    pub striker_id: String,
    pub non_striker_id: String,
    pub runs_off_bat: u32,
    #[serde(default)]
    pub extras_type: ExtrasType,
    #[serde(default)]
    pub extras_runs: u32,
    #[serde(default)]
    pub wicket_type: WicketType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed_player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keeper_id: Option<String>,
    #[serde(default)]
    pub is_free_hit: bool,
    pub recorded_at: DateTime<Utc>,
}

impl Ball {
    pub fn is_legal(&self) -> bool {
        rules::is_legal_delivery(self.extras_type)
    }

    pub fn total_runs(&self) -> u32 {
        rules::total_runs(self.runs_off_bat, self.extras_runs)
    }

    pub fn display_token(&self) -> String {
        rules::ball_display_token(self.runs_off_bat, self.extras_type, self.extras_runs, self.wicket_type)
    }

    pub fn batters_crossed(&self) -> bool {
        rules::should_rotate_strike(self.runs_off_bat, self.extras_type, self.extras_runs)
    }

    /// Who faces next and who is at the other end, given whether this ball
    /// finished the over. A dismissed batter leaves an empty slot.
    pub fn next_batters(&self, over_completed: bool) -> (Option<String>, Option<String>) {
        let mut striker = Some(self.striker_id.clone());
        let mut non_striker = Some(self.non_striker_id.clone());
        if self.batters_crossed() != over_completed {
            std::mem::swap(&mut striker, &mut non_striker);
        }
        if let Some(out) = self.dismissed_player_id.as_deref() {
            if striker.as_deref() == Some(out) {
                striker = None;
            }
            if non_striker.as_deref() == Some(out) {
                non_striker = None;
            }
        }
        (striker, non_striker)
    }
}

/// A bowler segment. A scorecard over is one or more contiguous segments
/// sharing an over number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Over {
    pub id: String,
    pub over_number: u32,
    pub bowler_id: String,
    #[serde(default)]
    pub balls: Vec<Ball>,
    pub created_at: DateTime<Utc>,
}

impl Over {
    pub fn legal_balls(&self) -> u32 {
        self.balls.iter().filter(|b| b.is_legal()).count() as u32
    }

    pub fn runs_conceded(&self) -> u32 {
        self.balls.iter().map(Ball::total_runs).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retirement {
    pub id: String,
    pub player_id: String,
    pub reason: String,
    pub retired_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumed_at: Option<DateTime<Utc>>,
}

impl Retirement {
    pub fn is_active(&self) -> bool {
        self.resumed_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Result of appending one delivery.
#[derive(Debug, Clone, Serialize)]
pub struct BallOutcome {
    pub ball: Ball,
    pub over_id: String,
    pub over_number: u32,
    pub display_token: String,
    pub batters_crossed: bool,
    pub over_completed: bool,
    pub swap_ends: bool,
    pub next_striker_id: Option<String>,
    pub next_non_striker_id: Option<String>,
    pub next_is_free_hit: bool,
    pub innings_completed: bool,
    pub total_runs: u32,
    pub wickets: u32,
    pub balls_bowled: u32,
    pub overs: String,
}

// Innings document: the ball log and the totals projected from it live together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub match_id: String,
    pub innings_number: u32,
    pub batting_side: Side,
    pub bowling_side: Side,
    pub overs_per_innings: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,

    #[serde(default)]
    pub overs: Vec<Over>,

    pub total_runs: u32,
    pub wickets: u32,
    pub balls_bowled: u32,
    pub is_completed: bool,

    #[serde(default)]
    pub retirements: Vec<Retirement>,

    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InningsRecord {
    pub fn new(
        match_id: &str,
        innings_number: u32,
        batting_side: Side,
        overs_per_innings: u32,
        target: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        InningsRecord {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            innings_number,
            batting_side,
            bowling_side: batting_side.opponent(),
            overs_per_innings,
            target,
            overs: Vec::new(),
            total_runs: 0,
            wickets: 0,
            balls_bowled: 0,
            is_completed: false,
            retirements: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> InningsStatus {
        if self.is_completed {
            InningsStatus::Completed
        } else if self.overs.is_empty() {
            InningsStatus::NotStarted
        } else {
            InningsStatus::InProgress
        }
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.overs.iter().flat_map(|over| over.balls.iter())
    }

    pub fn delivery_count(&self) -> u32 {
        self.balls().count() as u32
    }

    pub fn last_ball(&self) -> Option<&Ball> {
        self.overs.iter().rev().find_map(|over| over.balls.last())
    }

    pub fn over(&self, over_id: &str) -> Option<&Over> {
        self.overs.iter().find(|over| over.id == over_id)
    }

    pub fn current_segment(&self) -> Option<&Over> {
        self.overs.last()
    }

    /// Scorecard over the next legal delivery belongs to (1-based).
    pub fn current_over_number(&self) -> u32 {
        self.balls_bowled / BALLS_PER_OVER + 1
    }

    pub fn legal_balls_in_over(&self, over_number: u32) -> u32 {
        self.overs
            .iter()
            .filter(|over| over.over_number == over_number)
            .map(Over::legal_balls)
            .sum()
    }

    pub fn is_free_hit(&self) -> bool {
        !self.is_completed && rules::is_free_hit(self.last_ball())
    }

    pub fn overs_display(&self) -> String {
        rules::overs_as_decimal(self.balls_bowled)
    }

    pub fn max_legal_balls(&self) -> u32 {
        self.overs_per_innings * BALLS_PER_OVER
    }

    pub fn balls_remaining(&self) -> u32 {
        self.max_legal_balls().saturating_sub(self.balls_bowled)
    }

    pub fn is_chase_complete(&self) -> bool {
        self.target.is_some_and(|target| self.total_runs >= target)
    }

    pub fn should_end(&self) -> bool {
        rules::innings_should_end(self.balls_bowled, self.wickets, self.overs_per_innings)
            || self.is_chase_complete()
    }

    pub fn dismissed_players(&self) -> HashSet<&str> {
        self.balls()
            .filter(|ball| ball.wicket_type.is_wicket())
            .filter_map(|ball| ball.dismissed_player_id.as_deref())
            .collect()
    }

    pub fn active_retirement(&self, player_id: &str) -> Option<&Retirement> {
        self.retirements
            .iter()
            .find(|r| r.player_id == player_id && r.is_active())
    }

    /// Batters expected at the crease for the next delivery, from the last ball.
    pub fn batters_at_crease(&self) -> (Option<String>, Option<String>) {
        let Some(ball) = self.last_ball() else {
            return (None, None);
        };
        let over_completed =
            ball.is_legal() && self.balls_bowled > 0 && self.balls_bowled % BALLS_PER_OVER == 0;
        let (striker, non_striker) = ball.next_batters(over_completed);
        let present = |id: Option<String>| id.filter(|id| self.active_retirement(id).is_none());
        (present(striker), present(non_striker))
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.is_completed {
            return Err(AppError::state(format!(
                "innings {} is completed",
                self.innings_number
            )));
        }
        Ok(())
    }

    /// Consecutive-over rule for a segment placed after `self.overs[..upto]`.
    fn ensure_bowler_can_bowl(&self, upto: usize, over_number: u32, bowler_id: &str) -> Result<()> {
        let earlier = &self.overs[..upto];
        let Some(previous) = earlier.iter().rev().find(|over| !over.is_empty()) else {
            return Ok(());
        };

        if previous.bowler_id == bowler_id {
            return Err(AppError::state(format!(
                "bowler {} bowled the previous over segment and cannot bowl consecutively",
                bowler_id
            )));
        }

        if previous.over_number == over_number {
            let finished_last_over = earlier
                .iter()
                .rev()
                .find(|over| over.over_number + 1 == over_number && !over.is_empty());
            if finished_last_over.is_some_and(|over| over.bowler_id == bowler_id) {
                return Err(AppError::state(format!(
                    "bowler {} bowled over {} and cannot take over {}",
                    bowler_id,
                    over_number - 1,
                    over_number
                )));
            }
        }

        Ok(())
    }

    /// Opens a new bowler segment. A trailing segment without deliveries is a
    /// correction, not a boundary, and is replaced.
    pub fn start_over(&mut self, over_number: u32, bowler_id: &str, now: DateTime<Utc>) -> Result<&Over> {
        self.ensure_in_progress()?;
        if bowler_id.is_empty() {
            return Err(AppError::invalid_data("bowler is required"));
        }

        let expected = self.current_over_number();
        if over_number != expected {
            return Err(AppError::state(format!(
                "over {} cannot be started now; the current over is {}",
                over_number, expected
            )));
        }

        let superseded = self.overs.last().is_some_and(Over::is_empty);
        let upto = self.overs.len() - usize::from(superseded);
        self.ensure_bowler_can_bowl(upto, over_number, bowler_id)?;

        if superseded {
            self.overs.pop();
        }
        self.overs.push(Over {
            id: Uuid::new_v4().to_string(),
            over_number,
            bowler_id: bowler_id.to_string(),
            balls: Vec::new(),
            created_at: now,
        });
        self.updated_at = now;

        Ok(&self.overs[self.overs.len() - 1])
    }

    /// Appends a delivery to the latest segment and moves the totals with it.
    pub fn record_ball(&mut self, over_id: &str, delivery: &Delivery, now: DateTime<Utc>) -> Result<BallOutcome> {
        rules::validate_delivery(delivery)?;
        self.ensure_in_progress()?;

        let segment_index = self
            .overs
            .iter()
            .position(|over| over.id == over_id)
            .ok_or_else(|| AppError::not_found("over", over_id))?;
        if segment_index + 1 != self.overs.len() {
            return Err(AppError::state(
                "deliveries can only be recorded in the latest over segment",
            ));
        }

        let over_number = self.overs[segment_index].over_number;
        if self.legal_balls_in_over(over_number) >= BALLS_PER_OVER {
            return Err(AppError::state(format!(
                "over {} is complete; start the next over",
                over_number
            )));
        }

        let free_hit = self.is_free_hit();
        if free_hit && !rules::wicket_allowed_on_free_hit(delivery.wicket_type) {
            return Err(AppError::state("only a run out is possible on a free hit"));
        }

        {
            let dismissed = self.dismissed_players();
            for batter in [&delivery.striker_id, &delivery.non_striker_id] {
                if dismissed.contains(batter.as_str()) {
                    return Err(AppError::state(format!("player {} is already out", batter)));
                }
            }
        }

        // A retired batter walking back out resumes the innings
        for retirement in self.retirements.iter_mut().filter(|r| r.is_active()) {
            if retirement.player_id == delivery.striker_id || retirement.player_id == delivery.non_striker_id {
                retirement.resumed_at = Some(now);
            }
        }

        let sequence = self.delivery_count() + 1;
        let segment = &mut self.overs[segment_index];
        let ball = Ball {
            id: Uuid::new_v4().to_string(),
            sequence,
            ball_number: segment.legal_balls() + 1,
            striker_id: delivery.striker_id.clone(),
            non_striker_id: delivery.non_striker_id.clone(),
            runs_off_bat: delivery.runs_off_bat,
            extras_type: delivery.extras_type,
            extras_runs: delivery.extras_runs,
            wicket_type: delivery.wicket_type,
            dismissed_player_id: delivery.dismissed_player_id.clone().filter(|_| delivery.wicket_type.is_wicket()),
            fielder_id: delivery.fielder_id.clone().filter(|id| !id.is_empty()),
            keeper_id: delivery.keeper_id.clone().filter(|id| !id.is_empty()),
            is_free_hit: free_hit,
            recorded_at: now,
        };
        segment.balls.push(ball.clone());
        let over_id = segment.id.clone();

        self.total_runs += ball.total_runs();
        if ball.wicket_type.is_wicket() {
            self.wickets += 1;
        }
        if ball.is_legal() {
            self.balls_bowled += 1;
        }

        let over_completed = ball.is_legal() && self.balls_bowled % BALLS_PER_OVER == 0;
        let batters_crossed = ball.batters_crossed();
        let (next_striker_id, next_non_striker_id) = ball.next_batters(over_completed);

        let innings_completed = self.should_end();
        self.is_completed = innings_completed;
        self.updated_at = now;

        Ok(BallOutcome {
            display_token: ball.display_token(),
            next_is_free_hit: self.is_free_hit(),
            ball,
            over_id,
            over_number,
            batters_crossed,
            over_completed,
            swap_ends: batters_crossed != over_completed,
            next_striker_id,
            next_non_striker_id,
            innings_completed,
            total_runs: self.total_runs,
            wickets: self.wickets,
            balls_bowled: self.balls_bowled,
            overs: self.overs_display(),
        })
    }

    /// Removes the most recent delivery. A completed innings reopens only when
    /// `allow_reopen` is set (no later innings has started).
    pub fn delete_last_ball(&mut self, allow_reopen: bool, now: DateTime<Utc>) -> Result<Ball> {
        if self.is_completed && !allow_reopen {
            return Err(AppError::state(format!(
                "innings {} is closed because the next innings has started",
                self.innings_number
            )));
        }

        let segment_index = self
            .overs
            .iter()
            .rposition(|over| !over.is_empty())
            .ok_or_else(|| AppError::state("there is no delivery to delete"))?;
        let ball = self.overs[segment_index]
            .balls
            .pop()
            .ok_or_else(|| AppError::state("there is no delivery to delete"))?;

        // Segments opened after this ball did not exist before it
        self.overs.truncate(segment_index + 1);

        self.total_runs = self.total_runs.saturating_sub(ball.total_runs());
        if ball.wicket_type.is_wicket() {
            self.wickets = self.wickets.saturating_sub(1);
        }
        if ball.is_legal() {
            self.balls_bowled = self.balls_bowled.saturating_sub(1);
        }

        // A batter who retired again after this ball keeps the later retirement
        // as their only active one.
        let retired_again: HashSet<String> = self
            .retirements
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.player_id.clone())
            .collect();
        for retirement in self.retirements.iter_mut() {
            let resumed_by_ball = retirement.resumed_at == Some(ball.recorded_at)
                && (retirement.player_id == ball.striker_id || retirement.player_id == ball.non_striker_id);
            if resumed_by_ball && !retired_again.contains(&retirement.player_id) {
                retirement.resumed_at = None;
            }
        }

        self.is_completed = self.should_end();
        self.updated_at = now;
        Ok(ball)
    }

    pub fn retire_batsman(&mut self, player_id: &str, reason: &str, now: DateTime<Utc>) -> Result<Retirement> {
        self.ensure_in_progress()?;
        if self.dismissed_players().contains(player_id) {
            return Err(AppError::state(format!("player {} is already out", player_id)));
        }
        if self.active_retirement(player_id).is_some() {
            return Err(AppError::state(format!("player {} has already retired", player_id)));
        }

        let retirement = Retirement {
            id: Uuid::new_v4().to_string(),
            player_id: player_id.to_string(),
            reason: reason.trim().to_string(),
            retired_at: now,
            resumed_at: None,
        };
        self.retirements.push(retirement.clone());
        self.updated_at = now;
        Ok(retirement)
    }

    /// Corrects the bowler of a segment nobody has bowled from yet.
    pub fn update_over_bowler(&mut self, over_id: &str, bowler_id: &str, now: DateTime<Utc>) -> Result<&Over> {
        self.ensure_in_progress()?;
        if bowler_id.is_empty() {
            return Err(AppError::invalid_data("bowler is required"));
        }

        let index = self
            .overs
            .iter()
            .position(|over| over.id == over_id)
            .ok_or_else(|| AppError::not_found("over", over_id))?;
        if !self.overs[index].is_empty() {
            return Err(AppError::state(
                "the bowler can only be changed before the segment's first delivery",
            ));
        }

        let over_number = self.overs[index].over_number;
        self.ensure_bowler_can_bowl(index, over_number, bowler_id)?;

        self.overs[index].bowler_id = bowler_id.to_string();
        self.updated_at = now;
        Ok(&self.overs[index])
    }
}
