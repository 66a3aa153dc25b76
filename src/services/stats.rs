//! Batting and bowling figures derived from the ordered ball log.
//!
//! Players missing from the name lookup are left out of the figures and out
//! of dismissal text; aggregation never fails.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::innings::{Ball, ExtrasType, Over, WicketType, BALLS_PER_OVER};
use crate::services::rules;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattingFigures {
    pub player_id: String,
    pub name: String,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: String,
    pub is_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlingFigures {
    pub player_id: String,
    pub name: String,
    pub legal_balls: u32,
    pub overs: String,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub economy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtrasBreakdown {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallOfWicket {
    pub wicket: u32,
    pub runs: u32,
    pub overs: String,
    pub player_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InningsStats {
    pub batting: Vec<BattingFigures>,
    pub bowling: Vec<BowlingFigures>,
    pub extras: ExtrasBreakdown,
    pub fall_of_wickets: Vec<FallOfWicket>,
}

impl InningsStats {
    pub fn batter(&self, player_id: &str) -> Option<&BattingFigures> {
        self.batting.iter().find(|b| b.player_id == player_id)
    }

    pub fn bowler(&self, player_id: &str) -> Option<&BowlingFigures> {
        self.bowling.iter().find(|b| b.player_id == player_id)
    }
}

/// Keeps first-appearance order while allowing lookups by player id.
struct Ledger<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Ledger<T> {
    fn new() -> Self {
        Ledger { rows: Vec::new(), index: HashMap::new() }
    }

    fn entry(&mut self, id: &str, create: impl FnOnce() -> T) -> &mut T {
        let slot = match self.index.get(id) {
            Some(&slot) => slot,
            None => {
                self.rows.push(create());
                self.index.insert(id.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[slot]
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let slot = *self.index.get(id)?;
        self.rows.get_mut(slot)
    }
}

pub fn aggregate(overs: &[Over], names: &HashMap<String, String>) -> InningsStats {
    let mut batting: Ledger<BattingFigures> = Ledger::new();
    let mut bowling: Ledger<BowlingFigures> = Ledger::new();
    let mut extras = ExtrasBreakdown::default();
    let mut fall_of_wickets = Vec::new();
    let mut running_total = 0;
    let mut legal_so_far = 0;

    for over in overs {
        let bowler_name = names.get(&over.bowler_id);

        for ball in &over.balls {
            running_total += ball.total_runs();
            if ball.is_legal() {
                legal_so_far += 1;
            }

            for batter_id in [&ball.striker_id, &ball.non_striker_id] {
                if let Some(name) = names.get(batter_id) {
                    batting.entry(batter_id, || new_batter(batter_id, name));
                }
            }

            if let Some(striker) = batting.get_mut(&ball.striker_id) {
                striker.runs += ball.runs_off_bat;
                if ball.is_legal() {
                    striker.balls += 1;
                }
                match ball.runs_off_bat {
                    4 => striker.fours += 1,
                    6 => striker.sixes += 1,
                    _ => {}
                }
            }

            match ball.extras_type {
                ExtrasType::Wide => extras.wides += ball.extras_runs,
                ExtrasType::NoBall => extras.no_balls += ball.extras_runs,
                ExtrasType::Bye => extras.byes += ball.extras_runs,
                ExtrasType::LegBye => extras.leg_byes += ball.extras_runs,
                ExtrasType::None => {}
            }
            extras.total += ball.extras_runs;

            if let Some(name) = bowler_name {
                let figures = bowling.entry(&over.bowler_id, || new_bowler(&over.bowler_id, name));
                figures.runs += ball.total_runs();
                if ball.is_legal() {
                    figures.legal_balls += 1;
                }
                if ball.wicket_type.credited_to_bowler() {
                    figures.wickets += 1;
                }
                match ball.extras_type {
                    ExtrasType::Wide => figures.wides += 1,
                    ExtrasType::NoBall => figures.no_balls += 1,
                    _ => {}
                }
            }

            if let Some(out_id) = ball.dismissed_player_id.as_deref().filter(|_| ball.wicket_type.is_wicket()) {
                fall_of_wickets.push(FallOfWicket {
                    wicket: fall_of_wickets.len() as u32 + 1,
                    runs: running_total,
                    overs: rules::overs_as_decimal(legal_so_far),
                    player_id: out_id.to_string(),
                    name: names.get(out_id).cloned(),
                });

                if let Some(batter) = batting.get_mut(out_id) {
                    if !batter.is_out {
                        batter.is_out = true;
                        batter.dismissal = dismissal_text(ball, &over.bowler_id, names);
                    }
                }
            }
        }

        if bowler_name.is_some() && is_maiden(over) {
            if let Some(figures) = bowling.get_mut(&over.bowler_id) {
                figures.maidens += 1;
            }
        }
    }

    for figures in &mut batting.rows {
        figures.strike_rate = rules::format_rate(rules::strike_rate(figures.runs, figures.balls));
    }
    for figures in &mut bowling.rows {
        figures.overs = rules::overs_as_decimal(figures.legal_balls);
        figures.economy = rules::format_rate(rules::economy(figures.runs, figures.legal_balls));
    }

    InningsStats {
        batting: batting.rows,
        bowling: bowling.rows,
        extras,
        fall_of_wickets,
    }
}

/// Six legal deliveries in one segment that conceded nothing. Wides and
/// no-balls in the segment are not part of the six.
pub fn is_maiden(over: &Over) -> bool {
    let legal: Vec<&Ball> = over.balls.iter().filter(|b| b.is_legal()).collect();
    legal.len() as u32 == BALLS_PER_OVER && legal.iter().all(|b| b.total_runs() == 0)
}

pub fn dismissal_text(ball: &Ball, bowler_id: &str, names: &HashMap<String, String>) -> Option<String> {
    let name = |id: Option<&str>| id.and_then(|id| names.get(id)).map(String::as_str);
    let bowler = name(Some(bowler_id));
    let fielder = name(ball.fielder_id.as_deref());
    let keeper = name(ball.keeper_id.as_deref());

    let parts: Vec<&str> = match ball.wicket_type {
        WicketType::None => return None,
        WicketType::Bowled => vec!["b", bowler.unwrap_or_default()],
        WicketType::Lbw => vec!["lbw b", bowler.unwrap_or_default()],
        WicketType::HitWicket => vec!["hit wicket b", bowler.unwrap_or_default()],
        WicketType::Caught if ball.fielder_id.as_deref() == Some(bowler_id) => {
            vec!["c & b", bowler.unwrap_or_default()]
        }
        WicketType::Caught => vec!["c", fielder.unwrap_or_default(), "b", bowler.unwrap_or_default()],
        WicketType::Stumps => vec!["stumped", keeper.unwrap_or_default(), "b", bowler.unwrap_or_default()],
        WicketType::RunOut => {
            return Some(match fielder {
                Some(fielder) => format!("run out ({})", fielder),
                None => "run out".to_string(),
            })
        }
    };

    let text = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(text)
}

fn new_batter(id: &str, name: &str) -> BattingFigures {
    BattingFigures {
        player_id: id.to_string(),
        name: name.to_string(),
        runs: 0,
        balls: 0,
        fours: 0,
        sixes: 0,
        strike_rate: "-".to_string(),
        is_out: false,
        dismissal: None,
    }
}

fn new_bowler(id: &str, name: &str) -> BowlingFigures {
    BowlingFigures {
        player_id: id.to_string(),
        name: name.to_string(),
        legal_balls: 0,
        overs: "0".to_string(),
        maidens: 0,
        runs: 0,
        wickets: 0,
        wides: 0,
        no_balls: 0,
        economy: "-".to_string(),
    }
}
