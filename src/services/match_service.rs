use std::sync::Arc;

use chrono::Utc;

use crate::database::ScoringStore;
use crate::errors::{AppError, Result};
use crate::models::cricket_match::{
    ChaseState, CricketMatch, Margin, MatchResult, MatchStatus, Side, Toss, TossDecision,
};
use crate::models::innings::{InningsRecord, MAX_WICKETS};
use crate::models::player::Player;
use crate::services::rules;

/// Match-level coordination: fixtures, toss, status, players and the result.
#[derive(Clone)]
pub struct MatchService {
    store: Arc<dyn ScoringStore>,
    max_write_retries: u32,
}

impl MatchService {
    pub fn new(store: Arc<dyn ScoringStore>, max_write_retries: u32) -> Self {
        MatchService { store, max_write_retries }
    }

    pub async fn create_match(&self, team_a: &str, team_b: &str, overs_per_innings: u32) -> Result<CricketMatch> {
        let (team_a, team_b) = (team_a.trim(), team_b.trim());
        if team_a.is_empty() || team_b.is_empty() {
            return Err(AppError::invalid_data("both team names are required"));
        }
        if team_a.eq_ignore_ascii_case(team_b) {
            return Err(AppError::invalid_data("a team cannot play itself"));
        }
        if overs_per_innings == 0 {
            return Err(AppError::invalid_data("overs per innings must be at least 1"));
        }

        let record = CricketMatch::new(team_a, team_b, overs_per_innings);
        self.store.insert_match(&record).await?;
        tracing::info!(match_id = %record.id, "🏏 Match created: {} vs {} ({} overs)", team_a, team_b, overs_per_innings);
        Ok(record)
    }

    pub async fn load_match(&self, match_id: &str) -> Result<CricketMatch> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::not_found("match", match_id))
    }

    async fn mutate_match<F>(&self, match_id: &str, mut apply: F) -> Result<CricketMatch>
    where
        F: FnMut(&mut CricketMatch) -> Result<()> + Send,
    {
        for attempt in 1..=self.max_write_retries.max(1) {
            let current = self.load_match(match_id).await?;
            let mut next = current.clone();
            apply(&mut next)?;
            next.version = current.version + 1;
            next.updated_at = Utc::now();

            if self.store.replace_match(&next, current.version).await? {
                return Ok(next);
            }
            tracing::warn!(match_id, attempt, "match changed during update; retrying");
        }

        Err(AppError::Conflict(format!("match '{}' kept changing during update", match_id)))
    }

    pub async fn record_toss(&self, match_id: &str, winner: Side, decision: TossDecision) -> Result<CricketMatch> {
        if !self.store.innings_for_match(match_id).await?.is_empty() {
            return Err(AppError::state("the toss cannot change once an innings has started"));
        }

        let record = self
            .mutate_match(match_id, |record| {
                if record.status == MatchStatus::Completed {
                    return Err(AppError::state("match is completed"));
                }
                record.toss = Some(Toss { winner, decision });
                Ok(())
            })
            .await?;

        tracing::info!(match_id, "🪙 Toss: {} won and chose to {:?}", record.team_name(winner), decision);
        Ok(record)
    }

    pub async fn update_match_status(&self, match_id: &str, status: MatchStatus) -> Result<CricketMatch> {
        let record = self
            .mutate_match(match_id, |record| {
                record.status = status;
                Ok(())
            })
            .await?;
        tracing::info!(match_id, "📝 Match status set to {:?}", status);
        Ok(record)
    }

    /// Records the operator's decision. `None` is a tie or no result.
    pub async fn update_match_winner(&self, match_id: &str, winner: Option<Side>) -> Result<CricketMatch> {
        let record = self
            .mutate_match(match_id, |record| {
                record.winner = winner;
                record.status = MatchStatus::Completed;
                Ok(())
            })
            .await?;

        match winner {
            Some(side) => tracing::info!(match_id, "🏆 Winner recorded: {}", record.team_name(side)),
            None => tracing::info!(match_id, "🤝 Match closed without a winner"),
        }
        Ok(record)
    }

    /// Status change that follows an innings event; a failure here must not
    /// undo the innings write that already landed.
    pub async fn follow_innings_event(&self, match_id: &str, status: MatchStatus) {
        if let Err(e) = self.update_match_status(match_id, status).await {
            tracing::warn!(match_id, "Could not move match to {:?}: {}", status, e);
        }
    }

    /// Returns the existing player with this name on that side, or registers one.
    pub async fn ensure_player(&self, match_id: &str, name: &str, side: Side) -> Result<Player> {
        self.load_match(match_id).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_data("player name is required"));
        }
        let key = Player::key_for(name);

        for _ in 0..self.max_write_retries.max(1) {
            let roster = self.store.players_for_match(match_id).await?;
            if let Some(existing) = roster.iter().find(|p| p.side == side && p.name_key == key) {
                return Ok(existing.clone());
            }

            let batting_order = roster.iter().filter(|p| p.side == side).count() as u32 + 1;
            let player = Player::new(match_id, name, side, batting_order);
            if self.store.insert_player(&player).await? {
                tracing::info!(match_id, player_id = %player.id, "👤 Player added: {} (#{})", player.name, batting_order);
                return Ok(player);
            }
        }

        Err(AppError::Conflict(format!("could not register player '{}'", name)))
    }

    pub async fn list_players(&self, match_id: &str) -> Result<Vec<Player>> {
        self.load_match(match_id).await?;
        let mut players = self.store.players_for_match(match_id).await?;
        players.sort_by_key(|p| (p.side == Side::TeamB, p.batting_order));
        Ok(players)
    }
}

pub fn chase_target(first: &InningsRecord) -> u32 {
    first.total_runs + 1
}

/// Chase figures for a second innings that carries a target.
pub fn chase_state(second: &InningsRecord) -> Option<ChaseState> {
    let target = second.target?;
    let runs_needed = target.saturating_sub(second.total_runs);
    let balls_remaining = second.balls_remaining();
    Some(ChaseState {
        target,
        runs_needed,
        balls_remaining,
        required_run_rate: rules::required_run_rate(runs_needed, balls_remaining),
    })
}

/// Result implied by the innings so far; `None` while it is still open.
pub fn projected_result(
    first: Option<&InningsRecord>,
    second: Option<&InningsRecord>,
    match_completed: bool,
) -> Option<MatchResult> {
    let (first, second) = match (first, second) {
        (Some(first), Some(second)) => (first, second),
        _ => return match_completed.then_some(MatchResult::Drawn),
    };

    let target = chase_target(first);
    if second.total_runs >= target {
        return Some(MatchResult::Won {
            side: second.batting_side,
            margin: Margin::Wickets(MAX_WICKETS.saturating_sub(second.wickets)),
        });
    }

    if second.is_completed {
        return Some(if first.total_runs > second.total_runs {
            MatchResult::Won {
                side: first.batting_side,
                margin: Margin::Runs(first.total_runs - second.total_runs),
            }
        } else {
            MatchResult::Tie
        });
    }

    match_completed.then_some(MatchResult::Drawn)
}
