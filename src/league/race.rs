//! Per-race extraction results.
//!
//! A `RaceResult` is what one processed scoreboard image produced: the race
//! number it was assigned at upload time and every row the extractor returned,
//! valid or not.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of races in a league.
pub const RACES_PER_LEAGUE: usize = 12;

/// A race number in `1..=12`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RaceNumber(u8);

impl RaceNumber {
    pub const FIRST: RaceNumber = RaceNumber(1);
    pub const LAST: RaceNumber = RaceNumber(RACES_PER_LEAGUE as u8);

    /// Returns `None` outside `1..=12`.
    pub fn new(number: u8) -> Option<Self> {
        if (1..=RACES_PER_LEAGUE as u8).contains(&number) {
            Some(Self(number))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot index into a player's rank sequence.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// The following race, or `None` after the last one.
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// All race numbers in order.
    pub fn all() -> impl Iterator<Item = RaceNumber> {
        (1..=RACES_PER_LEAGUE as u8).map(RaceNumber)
    }
}

impl TryFrom<u8> for RaceNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        RaceNumber::new(value).ok_or_else(|| format!("race number {} out of range 1-12", value))
    }
}

impl From<RaceNumber> for u8 {
    fn from(race: RaceNumber) -> u8 {
        race.0
    }
}

impl fmt::Display for RaceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One player row as returned by the extractor. Fields are uninterpreted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Raw (uncanonicalized) player name
    pub player: String,
    /// Raw team label, e.g. "Team A (BLUE)"
    pub team: String,
    pub score: u32,
    /// Rank label, e.g. "1st"
    pub rank: String,
}

impl ExtractedRow {
    pub fn new(player: &str, team: &str, score: u32, rank: &str) -> Self {
        Self {
            player: player.to_string(),
            team: team.to_string(),
            score,
            rank: rank.to_string(),
        }
    }

    /// A row is valid when its player name is non-empty after trimming.
    /// Invalid rows stay in the race for display but never reach the ledger.
    pub fn is_valid(&self) -> bool {
        !self.player.trim().is_empty()
    }
}

/// Everything one processed image produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    /// File name of the source image
    pub source: String,
    pub race: RaceNumber,
    pub rows: Vec<ExtractedRow>,
    pub processed_at: DateTime<Local>,
    /// Set when extraction failed and `rows` is empty because of it
    #[serde(default)]
    pub error: Option<String>,
}

impl RaceResult {
    pub fn new(source: impl Into<String>, race: RaceNumber, rows: Vec<ExtractedRow>) -> Self {
        Self {
            source: source.into(),
            race,
            rows,
            processed_at: Local::now(),
            error: None,
        }
    }

    /// An empty result recorded for a race whose extraction failed.
    pub fn failed(source: impl Into<String>, race: RaceNumber, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(source, race, Vec::new())
        }
    }

    /// Rows eligible for merging.
    pub fn valid_rows(&self) -> impl Iterator<Item = &ExtractedRow> {
        self.rows.iter().filter(|row| row.is_valid())
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_valid()).count()
    }
}
