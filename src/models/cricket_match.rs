use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    TeamA,
    TeamB,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::TeamA => Side::TeamB,
            Side::TeamB => Side::TeamA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    StartingSoon,
    Live,
    InningsBreak,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossDecision {
    Bat,
    Bowl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    pub winner: Side,
    pub decision: TossDecision,
}

impl Toss {
    /// Side that bats first according to the toss call.
    pub fn batting_first(&self) -> Side {
        match self.decision {
            TossDecision::Bat => self.winner,
            TossDecision::Bowl => self.winner.opponent(),
        }
    }
}

// Main match document - one per fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CricketMatch {
    #[serde(rename = "_id")]
    pub id: String,

    pub team_a: String,
    pub team_b: String,
    pub overs_per_innings: u32,
    pub status: MatchStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toss: Option<Toss>,

    // Set only through the explicit operator action; None after completion means tie/no result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,

    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CricketMatch {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>, overs_per_innings: u32) -> Self {
        let now = Utc::now();
        CricketMatch {
            id: Uuid::new_v4().to_string(),
            team_a: team_a.into(),
            team_b: team_b.into(),
            overs_per_innings,
            status: MatchStatus::Upcoming,
            toss: None,
            winner: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn team_name(&self, side: Side) -> &str {
        match side {
            Side::TeamA => &self.team_a,
            Side::TeamB => &self.team_b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Margin {
    Wickets(u32),
    Runs(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Won { side: Side, margin: Margin },
    Tie,
    Drawn,
}

impl MatchResult {
    pub fn describe(&self, record: &CricketMatch) -> String {
        match self {
            MatchResult::Won { side, margin } => {
                let team = record.team_name(*side);
                match margin {
                    Margin::Wickets(1) => format!("{} won by 1 wicket", team),
                    Margin::Wickets(n) => format!("{} won by {} wickets", team, n),
                    Margin::Runs(1) => format!("{} won by 1 run", team),
                    Margin::Runs(n) => format!("{} won by {} runs", team, n),
                }
            }
            MatchResult::Tie => "Match tied".to_string(),
            MatchResult::Drawn => "Match drawn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaseState {
    pub target: u32,
    pub runs_needed: u32,
    pub balls_remaining: u32,
    pub required_run_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toss_decides_first_batting_side() {
        let toss = Toss { winner: Side::TeamB, decision: TossDecision::Bowl };
        assert_eq!(toss.batting_first(), Side::TeamA);

        let toss = Toss { winner: Side::TeamB, decision: TossDecision::Bat };
        assert_eq!(toss.batting_first(), Side::TeamB);
    }

    #[test]
    fn result_descriptions_pluralise_margins() {
        let record = CricketMatch::new("Lions", "Tigers", 20);
        let one_run = MatchResult::Won { side: Side::TeamA, margin: Margin::Runs(1) };
        let wickets = MatchResult::Won { side: Side::TeamB, margin: Margin::Wickets(7) };

        assert_eq!(one_run.describe(&record), "Lions won by 1 run");
        assert_eq!(wickets.describe(&record), "Tigers won by 7 wickets");
        assert_eq!(MatchResult::Tie.describe(&record), "Match tied");
    }

    #[test]
    fn sides_serialise_in_snake_case() {
        let json = serde_json::to_value(Side::TeamA).unwrap();
        assert_eq!(json, "team_a");
        let status: MatchStatus = serde_json::from_str("\"innings_break\"").unwrap();
        assert_eq!(status, MatchStatus::InningsBreak);
    }
}
