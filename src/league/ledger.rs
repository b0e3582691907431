//! The running cross-race player ledger and the race merger.
//!
//! Every operation here takes the ledger by reference and returns a new one;
//! callers replace their copy. Nothing mutates a ledger in place.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use super::aggregate::recalculate;
use super::matcher::{MAX_PLAYERS, resolve};
use super::race::{ExtractedRow, RACES_PER_LEAGUE, RaceNumber};

/// Team label of a player whose team has not been read yet.
pub const UNASSIGNED_TEAM: &str = "Unassigned";

pub const RACES_PER_GRAND_PRIX: usize = 4;
pub const GRAND_PRIX_COUNT: usize = RACES_PER_LEAGUE / RACES_PER_GRAND_PRIX;

/// Matches the color qualifier that locks a team label, e.g. "Kart Club (BLUE)".
const COLOR_QUALIFIER_PATTERN: &str = r"(?i)\(\s*(blue|red)\s*\)";

fn color_qualifier_regex() -> &'static Regex {
    static QUALIFIER: OnceLock<Regex> = OnceLock::new();
    QUALIFIER.get_or_init(|| Regex::new(COLOR_QUALIFIER_PATTERN).expect("valid qualifier pattern"))
}

/// True when the team label carries a "(BLUE)" or "(RED)" qualifier.
pub fn has_color_qualifier(team: &str) -> bool {
    color_qualifier_regex().is_match(team)
}

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("no player named '{0}' in the ledger")]
    UnknownPlayer(String),
    #[error("a player named '{0}' already exists")]
    NameTaken(String),
    #[error("player name cannot be empty")]
    EmptyName,
}

/// One ledger entry, keyed by its canonical name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPlayer {
    pub name: String,
    pub team: String,
    /// Rank label per race; index i is race i+1. `None` means not recorded.
    pub ranks: [Option<String>; RACES_PER_LEAGUE],
    /// Subtotal per grand prix, `None` until the grand prix's last race is in
    pub grand_prix: [Option<u32>; GRAND_PRIX_COUNT],
    pub total: u32,
    /// Overall position label relative to the rest of the ledger
    pub rank: Option<String>,
}

impl CanonicalPlayer {
    pub fn new(name: &str, team: &str) -> Self {
        Self {
            name: name.to_string(),
            team: team.to_string(),
            ranks: std::array::from_fn(|_| None),
            grand_prix: [None; GRAND_PRIX_COUNT],
            total: 0,
            rank: None,
        }
    }

    /// Number of races with a recorded rank.
    pub fn races_recorded(&self) -> usize {
        self.ranks.iter().filter(|slot| slot.is_some()).count()
    }

    /// Applies the team-lock rule: take the incoming label only if it is
    /// color-qualified and the current one is not.
    fn offer_team(&mut self, incoming: &str) {
        let incoming = incoming.trim();
        if incoming.is_empty() || !has_color_qualifier(incoming) {
            return;
        }
        if self.team == UNASSIGNED_TEAM || !has_color_qualifier(&self.team) {
            self.team = incoming.to_string();
        }
    }
}

/// Ordered collection of players. Order is creation order and breaks rank ties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    players: Vec<CanonicalPlayer>,
}

impl Ledger {
    pub fn from_players(players: Vec<CanonicalPlayer>) -> Self {
        Self { players }
    }

    /// One unassigned, unranked entry per roster name (duplicates skipped,
    /// capped at the player limit).
    pub fn seeded(roster: &[String]) -> Self {
        let mut players: Vec<CanonicalPlayer> = Vec::new();
        for name in roster {
            let name = name.trim();
            if name.is_empty() || players.iter().any(|p| p.name == name) {
                continue;
            }
            if players.len() == MAX_PLAYERS {
                break;
            }
            players.push(CanonicalPlayer::new(name, UNASSIGNED_TEAM));
        }
        recalculate(&Self { players })
    }

    pub fn players(&self) -> &[CanonicalPlayer] {
        &self.players
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players sorted by total score, ties in ledger order.
    pub fn by_rank(&self) -> Vec<&CanonicalPlayer> {
        let mut sorted: Vec<&CanonicalPlayer> = self.players.iter().collect();
        sorted.sort_by(|a, b| b.total.cmp(&a.total));
        sorted
    }

    /// Folds one race's rows into the ledger and refreshes the aggregates.
    ///
    /// `roster` is the user-supplied name list, used to seed the ledger on
    /// race 1 and as the matching roster while the ledger is still empty.
    /// Rows with blank names or that cannot be reconciled are skipped.
    pub fn merge<'a>(
        &self,
        rows: impl IntoIterator<Item = &'a ExtractedRow>,
        race: RaceNumber,
        roster: &[String],
    ) -> Ledger {
        let mut players = if race == RaceNumber::FIRST && !roster.is_empty() && self.is_empty() {
            Ledger::seeded(roster).players
        } else {
            self.players.clone()
        };

        let effective_roster: Vec<String> = if players.is_empty() {
            roster.to_vec()
        } else {
            players.iter().map(|p| p.name.clone()).collect()
        };

        for row in rows.into_iter().filter(|row| row.is_valid()) {
            let name = resolve(row.player.trim(), &effective_roster);
            if name.is_empty() {
                crate::log(&format!(
                    "Race {}: dropped unreconcilable player '{}'",
                    race,
                    row.player.trim()
                ));
                continue;
            }

            let index = match players.iter().position(|p| p.name == name) {
                Some(index) => index,
                None if players.len() < MAX_PLAYERS => {
                    let team = match row.team.trim() {
                        "" => UNASSIGNED_TEAM,
                        team => team,
                    };
                    players.push(CanonicalPlayer::new(&name, team));
                    players.len() - 1
                }
                None => {
                    crate::log(&format!(
                        "Race {}: ledger full, skipped new player '{}'",
                        race, name
                    ));
                    continue;
                }
            };

            let player = &mut players[index];
            let label = row.rank.trim();
            player.ranks[race.index()] = (!label.is_empty()).then(|| label.to_string());
            player.offer_team(&row.team);
        }

        recalculate(&Ledger { players })
    }

    /// Renames a player, keeping every race slot and aggregate.
    pub fn rename(&self, from: &str, to: &str) -> Result<Ledger, LedgerError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.name == from)
            .ok_or_else(|| LedgerError::UnknownPlayer(from.to_string()))?;
        if from != to && self.get(to).is_some() {
            return Err(LedgerError::NameTaken(to.to_string()));
        }

        let mut players = self.players.clone();
        players[index].name = to.to_string();
        Ok(recalculate(&Ledger { players }))
    }
}
