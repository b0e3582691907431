//! Export entry points used by the GUI.
//!
//! Every export lands in the given directory with a `%Y%m%d_%H%M%S` suffix.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::charts::generate_league_table;
use super::config::ChartConfig;
use super::csv_writer::{has_detail_rows, write_detail_csv, write_summary_csv};
use crate::league::standings::{TeamStanding, team_standings};
use crate::league::{LeagueSession, Ledger};

/// File name `<stem>_<YYYYmmdd_HHMMSS>.<ext>`.
pub fn timestamped_name(stem: &str, ext: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", stem, at.format("%Y%m%d_%H%M%S"), ext)
}

fn target(dir: &Path, stem: &str, ext: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    Ok(dir.join(timestamped_name(stem, ext, Local::now())))
}

/// Summary CSV. `None` when the ledger is empty and nothing was written.
pub fn export_summary_csv(session: &LeagueSession, dir: &Path) -> Result<Option<PathBuf>> {
    if session.ledger().is_empty() {
        crate::log("Summary export skipped: no players yet");
        return Ok(None);
    }
    let path = target(dir, "league_summary", "csv")?;
    write_summary_csv(session.ledger(), &path)?;
    crate::log(&format!("Summary CSV written to {}", path.display()));
    Ok(Some(path))
}

/// Detail CSV. `None` when no race has a valid row and nothing was written.
pub fn export_detail_csv(session: &LeagueSession, dir: &Path) -> Result<Option<PathBuf>> {
    if !has_detail_rows(session) {
        crate::log("Detail export skipped: no race rows yet");
        return Ok(None);
    }
    let path = target(dir, "league_detail", "csv")?;
    let rows = write_detail_csv(session, &path)?;
    crate::log(&format!("Detail CSV written to {} ({} rows)", path.display(), rows));
    Ok(Some(path))
}

pub fn export_table_png(session: &LeagueSession, dir: &Path, config: &ChartConfig) -> Result<PathBuf> {
    let path = target(dir, "league_table", "png")?;
    generate_league_table(session, &path, config)?;
    Ok(path)
}

/// Serialized form of the JSON snapshot.
#[derive(Debug, Serialize)]
pub struct LeagueSnapshot<'a> {
    pub title: &'a str,
    pub exported_at: DateTime<Local>,
    pub teams: [TeamStanding; 2],
    pub ledger: &'a Ledger,
}

impl<'a> LeagueSnapshot<'a> {
    pub fn of(session: &'a LeagueSession) -> Self {
        Self {
            title: &session.title,
            exported_at: Local::now(),
            teams: team_standings(session.ledger(), session.teams(), session.shocks()),
            ledger: session.ledger(),
        }
    }
}

/// Writes the snapshot pretty-printed.
pub fn export_to_json(session: &LeagueSession, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&LeagueSnapshot::of(session))
        .context("Failed to serialize league to JSON")?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

pub fn export_json(session: &LeagueSession, dir: &Path) -> Result<PathBuf> {
    let path = target(dir, "league", "json")?;
    export_to_json(session, &path)?;
    crate::log(&format!("JSON snapshot written to {}", path.display()));
    Ok(path)
}
