//! Shock-event log: which team took the shock in each race.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::race::RaceNumber;

/// Sparse race → team mapping. At most one team per race.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockLog {
    entries: BTreeMap<u8, String>,
}

impl ShockLog {
    /// Toggles a team's shock for a race.
    ///
    /// The same team again clears the race; another team replaces it.
    pub fn toggle(&self, race: RaceNumber, team: &str) -> ShockLog {
        let mut entries = self.entries.clone();
        if entries.get(&race.get()).map(String::as_str) == Some(team) {
            entries.remove(&race.get());
        } else {
            entries.insert(race.get(), team.to_string());
        }
        ShockLog { entries }
    }

    pub fn get(&self, race: RaceNumber) -> Option<&str> {
        self.entries.get(&race.get()).map(String::as_str)
    }

    pub fn is_shocked(&self, race: RaceNumber, team: &str) -> bool {
        self.get(race) == Some(team)
    }

    /// Number of races in which `team` took the shock.
    pub fn count_for(&self, team: &str) -> usize {
        self.entries.values().filter(|t| t.as_str() == team).count()
    }

    /// Rewrites every entry recorded under `from` to `to`.
    pub fn relabel(&self, from: &str, to: &str) -> ShockLog {
        let entries = self
            .entries
            .iter()
            .map(|(race, team)| {
                let team = if team == from { to } else { team.as_str() };
                (*race, team.to_string())
            })
            .collect();
        ShockLog { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RaceNumber, &str)> {
        self.entries
            .iter()
            .filter_map(|(race, team)| RaceNumber::new(*race).map(|r| (r, team.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
