//! CSV exports of the league.
//!
//! Two files: a one-row-per-player summary in rank order, and a detail file
//! with one row per valid extracted row across every processed race.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::league::matcher::resolve;
use crate::league::{LeagueSession, Ledger, UNASSIGNED_TEAM};

const SUMMARY_HEADER: &str = "Player Name,Team,Score";

/// Quotes a field when it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Writes the per-player summary. Returns `false` without creating a file
/// when the ledger is empty.
pub fn write_summary_csv(ledger: &Ledger, path: &Path) -> Result<bool> {
    if ledger.is_empty() {
        crate::log("Summary CSV skipped: ledger is empty");
        return Ok(false);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", SUMMARY_HEADER).context("Failed to write CSV header")?;
    for player in ledger.by_rank() {
        writeln!(
            out,
            "{},{},{}",
            escape_field(&player.name),
            escape_field(&player.team),
            player.total
        )
        .context("Failed to write CSV row")?;
    }
    out.flush().context("Failed to flush CSV file")?;
    Ok(true)
}

/// Header of the detail file; the shock columns are named after the teams.
pub fn detail_header(session: &LeagueSession) -> String {
    let [first, second] = session.teams();
    format!(
        "Timestamp,Race,Team,Player,Delta,Score,{},{}",
        escape_field(&format!("Shock {}", first.label())),
        escape_field(&format!("Shock {}", second.label())),
    )
}

/// True when at least one processed race has a row worth exporting.
pub fn has_detail_rows(session: &LeagueSession) -> bool {
    session.races().iter().any(|race| race.valid_rows().next().is_some())
}

/// Writes one row per valid extracted row of every processed race. Player
/// names are shown as they resolve against the current ledger; the Delta
/// column carries the race rank label. Returns 0 without creating a file
/// when no race has a valid row.
pub fn write_detail_csv(session: &LeagueSession, path: &Path) -> Result<usize> {
    if !has_detail_rows(session) {
        crate::log("Detail CSV skipped: no race rows");
        return Ok(0);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", detail_header(session)).context("Failed to write CSV header")?;

    let ledger = session.ledger();
    let known = ledger.names();
    let labels = session.teams().clone().map(|team| team.label());
    let mut written = 0;

    for race in session.races() {
        let timestamp = race.processed_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let shocks = labels
            .clone()
            .map(|label| u8::from(session.shocks().is_shocked(race.race, &label)));

        for row in race.valid_rows() {
            let raw = row.player.trim();
            let resolved = resolve(raw, &known);
            let player = if resolved.is_empty() { raw } else { resolved.as_str() };

            let team = match ledger.get(player) {
                Some(entry) => entry.team.clone(),
                None if row.team.trim().is_empty() => UNASSIGNED_TEAM.to_string(),
                None => row.team.trim().to_string(),
            };

            writeln!(
                out,
                "{},{},{},{},{},{},{},{}",
                timestamp,
                race.race,
                escape_field(&team),
                escape_field(player),
                escape_field(row.rank.trim()),
                row.score,
                shocks[0],
                shocks[1],
            )
            .context("Failed to write CSV row")?;
            written += 1;
        }
    }

    out.flush().context("Failed to flush CSV file")?;
    Ok(written)
}
