//! The explicitly-owned league state.
//!
//! Holds everything the GUI shows and the storage layer persists. Every change
//! goes through a method here, which swaps in freshly computed ledger and shock
//! log values rather than editing them in place.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::ledger::{Ledger, LedgerError};
use super::matcher::{MAX_PLAYERS, resolve};
use super::race::{RaceNumber, RaceResult};
use super::shock::ShockLog;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamColor {
    Blue,
    Red,
}

impl TeamColor {
    pub const ALL: [TeamColor; 2] = [TeamColor::Blue, TeamColor::Red];

    /// The qualifier written in parentheses after a team name.
    pub fn qualifier(self) -> &'static str {
        match self {
            TeamColor::Blue => "BLUE",
            TeamColor::Red => "RED",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            TeamColor::Blue => [52, 120, 220],
            TeamColor::Red => [220, 60, 60],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub color: TeamColor,
}

impl TeamConfig {
    pub fn new(name: &str, color: TeamColor) -> Self {
        Self {
            name: name.to_string(),
            color,
        }
    }

    /// Label as it appears on scoreboards and in the shock log, e.g. "Kart Club (BLUE)".
    pub fn label(&self) -> String {
        format!("{} ({})", self.name.trim(), self.color.qualifier())
    }

    /// Whether a player's team label belongs to this team.
    pub fn owns(&self, team_label: &str) -> bool {
        let qualifier = format!("({})", self.color.qualifier());
        team_label.to_uppercase().replace(' ', "").contains(&qualifier)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueSession {
    pub title: String,
    teams: [TeamConfig; 2],
    roster: Vec<String>,
    ledger: Ledger,
    shocks: ShockLog,
    races: Vec<RaceResult>,
}

impl Default for LeagueSession {
    fn default() -> Self {
        Self {
            title: "Race League".to_string(),
            teams: [
                TeamConfig::new("Team A", TeamColor::Blue),
                TeamConfig::new("Team B", TeamColor::Red),
            ],
            roster: Vec::new(),
            ledger: Ledger::default(),
            shocks: ShockLog::default(),
            races: Vec::new(),
        }
    }
}

impl LeagueSession {
    pub fn teams(&self) -> &[TeamConfig; 2] {
        &self.teams
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn shocks(&self) -> &ShockLog {
        &self.shocks
    }

    /// Processed races, ordered by race number.
    pub fn races(&self) -> &[RaceResult] {
        &self.races
    }

    pub fn race(&self, race: RaceNumber) -> Option<&RaceResult> {
        self.races.iter().find(|r| r.race == race)
    }

    /// The roster can only be edited before the first race is processed.
    pub fn roster_locked(&self) -> bool {
        !self.races.is_empty()
    }

    /// Replaces the user roster from comma or newline separated text.
    ///
    /// Names are trimmed, duplicates and blanks dropped, and the list is cut
    /// at the player limit. Returns the number of names kept.
    pub fn set_roster_text(&mut self, text: &str) -> Result<usize> {
        if self.roster_locked() {
            bail!("Roster cannot change after races have been processed");
        }
        let mut roster: Vec<String> = Vec::new();
        for name in text.split([',', '\n']).map(str::trim) {
            if !name.is_empty() && !roster.iter().any(|n| n == name) {
                roster.push(name.to_string());
            }
        }
        if roster.len() > MAX_PLAYERS {
            crate::log(&format!(
                "Roster has {} names, keeping the first {}",
                roster.len(),
                MAX_PLAYERS
            ));
            roster.truncate(MAX_PLAYERS);
        }
        self.roster = roster;
        Ok(self.roster.len())
    }

    /// Updates a team's name or color. Shock entries follow the new label.
    pub fn set_team(&mut self, index: usize, team: TeamConfig) {
        let Some(current) = self.teams.get(index) else {
            return;
        };
        let (old_label, new_label) = (current.label(), team.label());
        if old_label != new_label {
            self.shocks = self.shocks.relabel(&old_label, &new_label);
        }
        self.teams[index] = team;
    }

    /// Names to hint the extractor with.
    pub fn hint_names(&self) -> Vec<String> {
        if self.ledger.is_empty() {
            self.roster.clone()
        } else {
            self.ledger.names()
        }
    }

    /// The race after the highest one processed so far.
    pub fn next_race_number(&self) -> Option<RaceNumber> {
        match self.races.iter().map(|r| r.race).max() {
            Some(last) => last.next(),
            None => Some(RaceNumber::FIRST),
        }
    }

    /// Records a race (replacing an earlier result for the same race number)
    /// and merges its valid rows into the ledger.
    pub fn apply_race(&mut self, result: RaceResult) {
        crate::log(&format!(
            "Merging race {} from {}: {} rows ({} invalid)",
            result.race,
            result.source,
            result.rows.len(),
            result.invalid_count()
        ));

        self.ledger = self
            .ledger
            .merge(result.valid_rows(), result.race, &self.roster);

        match self.races.iter().position(|r| r.race == result.race) {
            Some(index) => self.races[index] = result,
            None => {
                let index = self.races.partition_point(|r| r.race < result.race);
                self.races.insert(index, result);
            }
        }
    }

    /// Renames a player in the ledger, the roster and every historical row
    /// that resolved to the old name.
    pub fn rename_player(&mut self, from: &str, to: &str) -> Result<(), LedgerError> {
        let known = self.ledger.names();
        let ledger = self.ledger.rename(from, to)?;
        let to = to.trim();

        for name in self.roster.iter_mut().filter(|n| n.as_str() == from) {
            *name = to.to_string();
        }
        for race in &mut self.races {
            for row in race.rows.iter_mut().filter(|row| row.is_valid()) {
                if resolve(row.player.trim(), &known) == from {
                    row.player = to.to_string();
                }
            }
        }

        self.ledger = ledger;
        crate::log(&format!("Renamed player '{}' to '{}'", from, to));
        Ok(())
    }

    /// Toggles the shock for one of the two configured teams.
    pub fn toggle_shock(&mut self, race: RaceNumber, team_index: usize) {
        if let Some(team) = self.teams.get(team_index) {
            self.shocks = self.shocks.toggle(race, &team.label());
        }
    }

    /// Clears ledger, shocks and race history. Title, teams and roster stay.
    pub fn reset(&mut self) {
        self.ledger = Ledger::default();
        self.shocks = ShockLog::default();
        self.races.clear();
        crate::log("League reset");
    }
}
