//! League table rendered to PNG with plotters.
//!
//! One row per player in rank order with team, the twelve race ranks, the
//! three grand-prix subtotals and the total. Rows are tinted by team color.
//! Styling is configurable via chart_config.json.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

use super::config::ChartConfig;
use crate::league::ledger::GRAND_PRIX_COUNT;
use crate::league::race::RACES_PER_LEAGUE;
use crate::league::standings::team_standings;
use crate::league::{CanonicalPlayer, LeagueSession, TeamConfig};

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// Column header and width, left to right.
pub fn table_columns(config: &ChartConfig) -> Vec<(String, u32)> {
    let layout = &config.layout;
    let mut columns = vec![
        ("#".to_string(), layout.rank_col_width),
        ("Player".to_string(), layout.name_col_width),
        ("Team".to_string(), layout.team_col_width),
    ];
    columns.extend((1..=RACES_PER_LEAGUE).map(|n| (format!("R{}", n), layout.race_col_width)));
    columns.extend((1..=GRAND_PRIX_COUNT).map(|n| (format!("GP{}", n), layout.gp_col_width)));
    columns.push(("Total".to_string(), layout.total_col_width));
    columns
}

/// Cell texts for one player, in column order. Unknown values are "-".
pub fn row_cells(player: &CanonicalPlayer) -> Vec<String> {
    let mut cells = vec![
        player.rank.clone().unwrap_or_else(|| "-".to_string()),
        player.name.clone(),
        player.team.clone(),
    ];
    cells.extend(
        player
            .ranks
            .iter()
            .map(|slot| slot.clone().unwrap_or_else(|| "-".to_string())),
    );
    cells.extend(
        player
            .grand_prix
            .iter()
            .map(|gp| gp.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())),
    );
    cells.push(player.total.to_string());
    cells
}

/// Background of a player row: the owning team's color faded toward white,
/// or the neutral color.
pub fn row_fill(team_label: &str, teams: &[TeamConfig; 2], config: &ChartConfig) -> [u8; 3] {
    match teams.iter().find(|team| team.owns(team_label)) {
        Some(team) => {
            let tint = config.colors.team_tint.clamp(0.0, 1.0);
            team.color
                .rgb()
                .map(|c| (255.0 - (255.0 - c as f64) * tint).round() as u8)
        }
        None => config.colors.neutral_row,
    }
}

/// Image size for a table with `rows` player rows.
pub fn table_size(config: &ChartConfig, rows: usize) -> (u32, u32) {
    let layout = &config.layout;
    let width: u32 = table_columns(config).iter().map(|(_, w)| w).sum();
    // Always leave room for one row so an empty table still renders
    let body = layout.row_height * rows.max(1) as u32;
    (
        width + layout.margin * 2,
        layout.margin * 2 + layout.title_height + layout.row_height + body,
    )
}

fn rgb(color: [u8; 3]) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

/// Renders the league table to `output_path`.
pub fn generate_league_table(
    session: &LeagueSession,
    output_path: &Path,
    config: &ChartConfig,
) -> Result<()> {
    let players = session.ledger().by_rank();
    let (width, height) = table_size(config, players.len());

    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .context("Failed to fill table background")?;

    let margin = config.layout.margin as i32;
    let title_font = ("sans-serif", config.font.title_size)
        .into_font()
        .style(FontStyle::Bold);
    root.draw_text(&session.title, &title_font.color(&BLACK), (margin, margin))?;

    // Team totals on the right of the title
    let standings = team_standings(session.ledger(), session.teams(), session.shocks());
    let summary = standings
        .iter()
        .map(|s| format!("{}: {} pts, {} shock(s)", s.label, s.total, s.shocks))
        .collect::<Vec<_>>()
        .join("   ");
    let summary_font = ("sans-serif", config.font.cell_size).into_font();
    let summary_width = summary.chars().count() as i32 * config.font.cell_size as i32 / 2;
    root.draw_text(
        &summary,
        &summary_font.color(&BLACK),
        (width as i32 - margin - summary_width, margin + 8),
    )?;

    let columns = table_columns(config);
    let top = margin + config.layout.title_height as i32;
    draw_header_row(&root, &columns, top, config)?;

    for (i, player) in players.iter().enumerate() {
        let y = top + config.layout.row_height as i32 * (i as i32 + 1);
        let fill = rgb(row_fill(&player.team, session.teams(), config));
        draw_row(&root, &columns, &row_cells(player), y, fill, config)?;
    }

    root.present().context("Failed to save league table")?;
    crate::log(&format!("League table written to {}", output_path.display()));
    Ok(())
}

fn draw_header_row(area: &Area, columns: &[(String, u32)], y: i32, config: &ChartConfig) -> Result<()> {
    let header_bg = rgb(config.colors.header_bg);
    let header_text = rgb(config.colors.header_text);
    let font = ("sans-serif", config.font.header_size)
        .into_font()
        .style(FontStyle::Bold);
    let row_height = config.layout.row_height as i32;
    let char_width = (config.font.header_size / 2) as i32;

    let mut x = config.layout.margin as i32;
    for (label, width) in columns {
        let width = *width as i32;
        area.draw(&Rectangle::new([(x, y), (x + width, y + row_height)], header_bg.filled()))?;
        let text_x = x + (width - label.len() as i32 * char_width) / 2;
        let text_y = y + (row_height - config.font.header_size as i32) / 2;
        area.draw_text(label, &font.color(&header_text), (text_x, text_y))?;
        x += width;
    }
    Ok(())
}

fn draw_row(
    area: &Area,
    columns: &[(String, u32)],
    cells: &[String],
    y: i32,
    fill: RGBColor,
    config: &ChartConfig,
) -> Result<()> {
    let grid = rgb(config.colors.grid_color);
    let font = ("sans-serif", config.font.cell_size).into_font();
    let row_height = config.layout.row_height as i32;
    let char_width = (config.font.cell_size / 2) as i32;

    let mut x = config.layout.margin as i32;
    for (i, ((_, width), text)) in columns.iter().zip(cells).enumerate() {
        let width = *width as i32;
        area.draw(&Rectangle::new([(x, y), (x + width, y + row_height)], fill.filled()))?;
        area.draw(&Rectangle::new([(x, y), (x + width, y + row_height)], grid.stroke_width(1)))?;

        // Name and team left-aligned, numbers centered
        let text_x = if i == 1 || i == 2 {
            x + 6
        } else {
            x + (width - text.chars().count() as i32 * char_width) / 2
        };
        let text_y = y + (row_height - config.font.cell_size as i32) / 2;
        area.draw_text(text, &font.color(&BLACK), (text_x, text_y))?;
        x += width;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::TeamColor;

    fn teams() -> [TeamConfig; 2] {
        [
            TeamConfig::new("Sharks", TeamColor::Blue),
            TeamConfig::new("Hawks", TeamColor::Red),
        ]
    }

    #[test]
    fn test_table_columns() {
        let columns = table_columns(&ChartConfig::default());
        assert_eq!(columns.len(), 3 + 12 + 3 + 1);
        assert_eq!(columns[3].0, "R1");
        assert_eq!(columns[15].0, "GP1");
        assert_eq!(columns.last().unwrap().0, "Total");
    }

    #[test]
    fn test_row_cells_match_columns() {
        let mut player = CanonicalPlayer::new("Alice", "Sharks (BLUE)");
        player.ranks[0] = Some("1st".to_string());
        player.total = 15;
        player.rank = Some("1st".to_string());

        let cells = row_cells(&player);
        assert_eq!(cells.len(), table_columns(&ChartConfig::default()).len());
        assert_eq!(cells[0], "1st");
        assert_eq!(cells[3], "1st");
        assert_eq!(cells[4], "-");
        assert_eq!(cells[15], "-");
        assert_eq!(cells.last().unwrap(), "15");
    }

    #[test]
    fn test_row_fill_follows_team_color() {
        let config = ChartConfig::default();
        let blue = row_fill("Sharks (BLUE)", &teams(), &config);
        let red = row_fill("Hawks (red)", &teams(), &config);
        let neutral = row_fill("Unassigned", &teams(), &config);

        assert!(blue[2] > blue[0]);
        assert!(red[0] > red[2]);
        assert_eq!(neutral, config.colors.neutral_row);
    }

    #[test]
    fn test_full_tint_is_team_color() {
        let mut config = ChartConfig::default();
        config.colors.team_tint = 1.0;
        assert_eq!(row_fill("Sharks (BLUE)", &teams(), &config), TeamColor::Blue.rgb());
    }

    #[test]
    fn test_table_size_grows_with_rows() {
        let config = ChartConfig::default();
        let (w0, h0) = table_size(&config, 0);
        let (w12, h12) = table_size(&config, 12);
        assert_eq!(w0, w12);
        assert_eq!(h12 - h0, config.layout.row_height * 11);
    }
}
