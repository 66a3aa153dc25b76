use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::MAX_RECENT_BALLS_WINDOW;
use crate::database::ScoringStore;
use crate::errors::{AppError, Result};
use crate::models::cricket_match::{CricketMatch, MatchResult, MatchStatus};
use crate::models::innings::{InningsRecord, Retirement, BALLS_PER_OVER};
use crate::models::views::{BallView, InningsDetail, InningsSummary, MatchSummary, Scorecard, ScorecardOver};
use crate::services::{match_service, rules, stats};

/// Spectator queries. Each call reads a snapshot; nothing here writes.
#[derive(Clone)]
pub struct ReadModels {
    store: Arc<dyn ScoringStore>,
    recent_window: usize,
}

impl ReadModels {
    pub fn new(store: Arc<dyn ScoringStore>, recent_window: usize) -> Self {
        ReadModels { store, recent_window }
    }

    async fn load_match(&self, match_id: &str) -> Result<CricketMatch> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::not_found("match", match_id))
    }

    async fn load_innings(&self, innings_id: &str) -> Result<InningsRecord> {
        self.store
            .get_innings(innings_id)
            .await?
            .ok_or_else(|| AppError::not_found("innings", innings_id))
    }

    async fn player_names(&self, match_id: &str) -> Result<HashMap<String, String>> {
        let players = self.store.players_for_match(match_id).await?;
        Ok(players.into_iter().map(|p| (p.id, p.name)).collect())
    }

    pub async fn current_innings(&self, match_id: &str) -> Result<Option<InningsSummary>> {
        let record = self.load_match(match_id).await?;
        let innings = self.store.innings_for_match(match_id).await?;
        Ok(innings
            .iter()
            .find(|i| !i.is_completed)
            .map(|i| summarize(&record, i)))
    }

    pub async fn all_innings(&self, match_id: &str) -> Result<Vec<InningsSummary>> {
        let record = self.load_match(match_id).await?;
        let innings = self.store.innings_for_match(match_id).await?;
        Ok(innings.iter().map(|i| summarize(&record, i)).collect())
    }

    /// Most recent deliveries first.
    pub async fn recent_balls(&self, innings_id: &str, limit: Option<usize>) -> Result<Vec<BallView>> {
        let innings = self.load_innings(innings_id).await?;
        let limit = limit
            .unwrap_or(self.recent_window)
            .clamp(1, MAX_RECENT_BALLS_WINDOW);

        let mut views = ball_views(&innings);
        views.reverse();
        views.truncate(limit);
        Ok(views)
    }

    pub async fn innings_detail(&self, innings_id: &str) -> Result<InningsDetail> {
        let innings = self.load_innings(innings_id).await?;
        let record = self.load_match(&innings.match_id).await?;

        Ok(InningsDetail {
            summary: summarize(&record, &innings),
            scorecard_overs: scorecard_overs(&innings),
            retirements: innings.retirements.clone(),
            overs: innings.overs,
        })
    }

    pub async fn retirements(&self, innings_id: &str) -> Result<Vec<Retirement>> {
        Ok(self.load_innings(innings_id).await?.retirements)
    }

    pub async fn scorecard(&self, innings_id: &str) -> Result<Scorecard> {
        let innings = self.load_innings(innings_id).await?;
        let record = self.load_match(&innings.match_id).await?;
        let players = self.store.players_for_match(&innings.match_id).await?;
        let names = self.player_names(&innings.match_id).await?;

        let figures = stats::aggregate(&innings.overs, &names);
        let appeared: HashSet<&str> = figures.batting.iter().map(|b| b.player_id.as_str()).collect();
        let mut yet_to_bat: Vec<_> = players
            .iter()
            .filter(|p| p.side == innings.batting_side && !appeared.contains(p.id.as_str()))
            .collect();
        yet_to_bat.sort_by_key(|p| p.batting_order);
        let yet_to_bat = yet_to_bat.into_iter().map(|p| p.name.clone()).collect();

        Ok(Scorecard {
            summary: summarize(&record, &innings),
            batting: figures.batting,
            bowling: figures.bowling,
            extras: figures.extras,
            fall_of_wickets: figures.fall_of_wickets,
            yet_to_bat,
            retirements: innings.retirements,
        })
    }

    pub async fn match_summary(&self, match_id: &str) -> Result<MatchSummary> {
        let record = self.load_match(match_id).await?;
        let innings = self.store.innings_for_match(match_id).await?;
        let first = innings.iter().find(|i| i.innings_number == 1);
        let second = innings.iter().find(|i| i.innings_number == 2);

        let projected_result = projected(first, second, record.status == MatchStatus::Completed);
        let result_text = match (record.status, record.winner) {
            (MatchStatus::Completed, Some(side)) => Some(format!("{} won", record.team_name(side))),
            _ => projected_result.map(|r| r.describe(&record)),
        };

        Ok(MatchSummary {
            innings: innings.iter().map(|i| summarize(&record, i)).collect(),
            current_innings_id: innings.iter().find(|i| !i.is_completed).map(|i| i.id.clone()),
            chase: second.and_then(match_service::chase_state),
            projected_result,
            result_text,
            winner: record.winner,
            winner_team: record.winner.map(|side| record.team_name(side).to_string()),
            fixture: record,
        })
    }
}

fn projected(
    first: Option<&InningsRecord>,
    second: Option<&InningsRecord>,
    match_completed: bool,
) -> Option<MatchResult> {
    // Nothing to project until the first innings is over
    if !first.is_some_and(|f| f.is_completed) && !match_completed {
        return None;
    }
    match_service::projected_result(first, second, match_completed)
}

pub fn summarize(record: &CricketMatch, innings: &InningsRecord) -> InningsSummary {
    let (striker_id, non_striker_id) = innings.batters_at_crease();
    let open_segment = innings
        .current_segment()
        .filter(|over| !innings.is_completed && innings.legal_balls_in_over(over.over_number) < BALLS_PER_OVER);

    InningsSummary {
        id: innings.id.clone(),
        match_id: innings.match_id.clone(),
        innings_number: innings.innings_number,
        status: innings.status(),
        batting_side: innings.batting_side,
        batting_team: record.team_name(innings.batting_side).to_string(),
        bowling_side: innings.bowling_side,
        bowling_team: record.team_name(innings.bowling_side).to_string(),
        total_runs: innings.total_runs,
        wickets: innings.wickets,
        balls_bowled: innings.balls_bowled,
        overs: innings.overs_display(),
        overs_per_innings: innings.overs_per_innings,
        score: format!("{}/{}", innings.total_runs, innings.wickets),
        run_rate: rules::format_rate(rules::run_rate(innings.total_runs, innings.balls_bowled)),
        current_over_number: innings.current_over_number().min(innings.overs_per_innings),
        current_over_id: open_segment.map(|over| over.id.clone()),
        current_bowler_id: open_segment.map(|over| over.bowler_id.clone()),
        striker_id,
        non_striker_id,
        is_free_hit: innings.is_free_hit(),
        target: innings.target,
        chase: match_service::chase_state(innings),
    }
}

/// Every delivery in chronological order.
pub fn ball_views(innings: &InningsRecord) -> Vec<BallView> {
    innings
        .overs
        .iter()
        .flat_map(|over| {
            over.balls.iter().map(move |ball| BallView {
                id: ball.id.clone(),
                sequence: ball.sequence,
                over_id: over.id.clone(),
                over_number: over.over_number,
                ball_number: ball.ball_number,
                bowler_id: over.bowler_id.clone(),
                striker_id: ball.striker_id.clone(),
                non_striker_id: ball.non_striker_id.clone(),
                runs_off_bat: ball.runs_off_bat,
                extras_type: ball.extras_type,
                extras_runs: ball.extras_runs,
                total_runs: ball.total_runs(),
                wicket_type: ball.wicket_type,
                dismissed_player_id: ball.dismissed_player_id.clone(),
                is_free_hit: ball.is_free_hit,
                display_token: ball.display_token(),
            })
        })
        .collect()
}

/// Groups contiguous segments with the same over number into scorecard overs.
pub fn scorecard_overs(innings: &InningsRecord) -> Vec<ScorecardOver> {
    let mut grouped: Vec<ScorecardOver> = Vec::new();

    for segment in &innings.overs {
        let starts_new = grouped.last().map_or(true, |last| last.over_number != segment.over_number);
        if starts_new {
            grouped.push(ScorecardOver {
                over_number: segment.over_number,
                segment_ids: Vec::new(),
                bowler_ids: Vec::new(),
                legal_balls: 0,
                runs: 0,
                wickets: 0,
                is_complete: false,
                tokens: Vec::new(),
            });
        }
        let Some(current) = grouped.last_mut() else {
            continue;
        };

        current.segment_ids.push(segment.id.clone());
        if !current.bowler_ids.contains(&segment.bowler_id) {
            current.bowler_ids.push(segment.bowler_id.clone());
        }
        current.legal_balls += segment.legal_balls();
        current.runs += segment.runs_conceded();
        current.wickets += segment.balls.iter().filter(|b| b.wicket_type.is_wicket()).count() as u32;
        current.tokens.extend(segment.balls.iter().map(|b| b.display_token()));
        current.is_complete = current.legal_balls >= BALLS_PER_OVER;
    }

    grouped
}
