//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic. Functions report what
//! the user clicked; the app applies it.

use eframe::egui::{self, Color32, RichText};
use std::time::Instant;

use super::state::{GuiState, ProcessingStatus, Toast, ToastKind};
use crate::league::race::RACES_PER_LEAGUE;
use crate::league::standings::team_standings;
use crate::league::{LeagueSession, RaceNumber, TeamColor};
use crate::report::csv_writer::has_detail_rows;

/// Clicks in the settings panel.
#[derive(Debug, Default)]
pub struct SettingsAction {
    pub apply_teams: bool,
    pub apply_roster: bool,
}

/// Clicks in the upload panel.
#[derive(Debug, Default)]
pub struct UploadAction {
    pub load_folder: bool,
    pub reprocess: bool,
}

/// Clicks in the actions panel.
#[derive(Debug, Default)]
pub struct ActionPanel {
    pub export_summary: bool,
    pub export_detail: bool,
    pub export_table: bool,
    pub export_json: bool,
    pub open_exports: bool,
    pub reset: bool,
}

fn team_color32(color: TeamColor) -> Color32 {
    let [r, g, b] = color.rgb();
    Color32::from_rgb(r, g, b)
}

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(4.0);
    ui.heading(title);
    ui.add_space(4.0);
}

/// Render league title, teams and roster.
pub fn render_settings(ui: &mut egui::Ui, state: &mut GuiState) -> SettingsAction {
    let mut action = SettingsAction::default();

    egui::CollapsingHeader::new("Settings")
        .default_open(state.session.races().is_empty())
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("League title:");
                ui.text_edit_singleline(&mut state.session.title);
            });

            ui.add_space(8.0);
            for (i, team) in state.team_edits.iter_mut().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(format!("Team {}:", i + 1));
                    ui.text_edit_singleline(&mut team.name);
                    egui::ComboBox::from_id_salt(("team_color", i))
                        .selected_text(team.color.qualifier())
                        .show_ui(ui, |ui| {
                            for color in TeamColor::ALL {
                                ui.selectable_value(&mut team.color, color, color.qualifier());
                            }
                        });
                    ui.label(RichText::new(team.label()).color(team_color32(team.color)));
                });
            }
            if ui.button("Apply teams").clicked() {
                action.apply_teams = true;
            }

            ui.add_space(8.0);
            let locked = state.session.roster_locked();
            ui.label("Roster (one name per line or comma separated, up to 12):");
            ui.add_enabled(
                !locked,
                egui::TextEdit::multiline(&mut state.roster_text).desired_rows(4),
            );
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!locked, |ui| {
                    if ui.button("Save roster").clicked() {
                        action.apply_roster = true;
                    }
                });
                if locked {
                    ui.label(
                        RichText::new("Roster is locked once races are processed")
                            .color(Color32::GRAY),
                    );
                }
            });
        });

    action
}

/// Render the upload area: drop hint, folder loader and re-process controls.
pub fn render_upload(ui: &mut egui::Ui, state: &mut GuiState) -> UploadAction {
    let mut action = UploadAction::default();
    section(ui, "Upload");

    let next = match state.next_upload_race() {
        Some(race) => format!("next upload is race {}", race),
        None => "all 12 races assigned".to_string(),
    };
    ui.label(format!("Drop scoreboard screenshots onto the window ({}).", next));

    ui.horizontal(|ui| {
        ui.label("Folder:");
        ui.text_edit_singleline(&mut state.folder_path);
        if ui.button("Load folder").clicked() {
            action.load_folder = true;
        }
    });

    ui.horizontal(|ui| {
        ui.label("Re-process race");
        ui.add(egui::DragValue::new(&mut state.reprocess_race).range(1..=RACES_PER_LEAGUE as u8));
        ui.label("from");
        ui.text_edit_singleline(&mut state.reprocess_path);
        if ui.button("Re-process").clicked() {
            action.reprocess = true;
        }
    });

    action
}

/// Render the extraction status line.
pub fn render_status(ui: &mut egui::Ui, status: &ProcessingStatus, in_flight: usize) {
    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.label("Status:");
        let color = match status {
            ProcessingStatus::Idle => Color32::GRAY,
            ProcessingStatus::Extracting { .. } => Color32::from_rgb(0, 120, 200),
            ProcessingStatus::Backoff { .. } => Color32::from_rgb(200, 150, 0),
        };
        ui.label(RichText::new(status.status_text(Instant::now())).color(color));
        if in_flight > 0 {
            ui.spinner();
            ui.label(format!("{} race(s) pending", in_flight));
        }
    });
}

/// Render processed races with every extracted row, invalid ones flagged.
pub fn render_race_history(ui: &mut egui::Ui, session: &LeagueSession) {
    section(ui, "Races");

    if session.races().is_empty() {
        ui.label(RichText::new("No races processed yet").color(Color32::GRAY));
        return;
    }

    for result in session.races() {
        let mut title = format!("Race {} - {} ({} rows)", result.race, result.source, result.rows.len());
        if result.invalid_count() > 0 {
            title.push_str(&format!(", {} invalid", result.invalid_count()));
        }
        if result.error.is_some() {
            title.push_str(", failed");
        }

        egui::CollapsingHeader::new(title)
            .id_salt(("race", result.race.get()))
            .show(ui, |ui| {
                if let Some(error) = &result.error {
                    ui.label(RichText::new(error).color(Color32::from_rgb(200, 0, 0)));
                }
                egui::Grid::new(("race_rows", result.race.get()))
                    .striped(true)
                    .show(ui, |ui| {
                        for header in ["Player", "Team", "Score", "Rank"] {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for row in &result.rows {
                            if row.is_valid() {
                                ui.label(&row.player);
                            } else {
                                ui.label(RichText::new("(no name)").color(Color32::from_rgb(200, 0, 0)));
                            }
                            ui.label(&row.team);
                            ui.label(row.score.to_string());
                            ui.label(&row.rank);
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Render the ledger table with per-race shock toggles.
/// Returns the (race, team index) whose shock was clicked.
pub fn render_ledger(ui: &mut egui::Ui, session: &LeagueSession) -> Option<(RaceNumber, usize)> {
    let mut toggled = None;
    section(ui, "League table");

    let standings = team_standings(session.ledger(), session.teams(), session.shocks());
    ui.horizontal(|ui| {
        for (team, standing) in session.teams().iter().zip(&standings) {
            ui.label(
                RichText::new(format!(
                    "{}: {} pts ({} players, {} shocks)",
                    standing.label, standing.total, standing.players, standing.shocks
                ))
                .color(team_color32(team.color))
                .strong(),
            );
            ui.add_space(16.0);
        }
    });
    ui.add_space(4.0);

    egui::ScrollArea::horizontal().id_salt("ledger_scroll").show(ui, |ui| {
        egui::Grid::new("ledger").striped(true).show(ui, |ui| {
            ui.label(RichText::new("#").strong());
            ui.label(RichText::new("Player").strong());
            ui.label(RichText::new("Team").strong());
            for race in RaceNumber::all() {
                ui.label(RichText::new(format!("R{}", race)).strong());
            }
            for gp in 1..=3 {
                ui.label(RichText::new(format!("GP{}", gp)).strong());
            }
            ui.label(RichText::new("Total").strong());
            ui.end_row();

            // Shock toggles, one pair per race
            ui.label("");
            ui.label(RichText::new("Shock").strong());
            ui.label("");
            for race in RaceNumber::all() {
                ui.horizontal(|ui| {
                    for (index, team) in session.teams().iter().enumerate() {
                        let active = session.shocks().is_shocked(race, &team.label());
                        let text = RichText::new(&team.color.qualifier()[..1])
                            .color(team_color32(team.color));
                        if ui
                            .selectable_label(active, text)
                            .on_hover_text(format!("Race {} shock: {}", race, team.label()))
                            .clicked()
                        {
                            toggled = Some((race, index));
                        }
                    }
                });
            }
            ui.end_row();

            for player in session.ledger().by_rank() {
                let team_color = session
                    .teams()
                    .iter()
                    .find(|team| team.owns(&player.team))
                    .map(|team| team_color32(team.color))
                    .unwrap_or(Color32::GRAY);

                ui.label(player.rank.as_deref().unwrap_or("-"));
                ui.label(RichText::new(&player.name).strong());
                ui.label(RichText::new(&player.team).color(team_color));
                for slot in &player.ranks {
                    ui.label(slot.as_deref().unwrap_or("-"));
                }
                for gp in &player.grand_prix {
                    ui.label(gp.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()));
                }
                ui.label(RichText::new(player.total.to_string()).strong());
                ui.end_row();
            }
        });
    });

    toggled
}

/// Render the rename controls. Returns true when Rename was clicked.
pub fn render_rename(ui: &mut egui::Ui, state: &mut GuiState) -> bool {
    let mut clicked = false;
    if state.session.ledger().is_empty() {
        return false;
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label("Rename");
        egui::ComboBox::from_id_salt("rename_from")
            .selected_text(if state.rename_from.is_empty() {
                "choose player"
            } else {
                state.rename_from.as_str()
            })
            .show_ui(ui, |ui| {
                for name in state.session.ledger().names() {
                    ui.selectable_value(&mut state.rename_from, name.clone(), name);
                }
            });
        ui.label("to");
        ui.text_edit_singleline(&mut state.rename_to);
        let ready = !state.rename_from.is_empty() && !state.rename_to.trim().is_empty();
        ui.add_enabled_ui(ready, |ui| {
            if ui.button("Rename").clicked() {
                clicked = true;
            }
        });
    });
    clicked
}

/// Render export and reset buttons.
pub fn render_actions(ui: &mut egui::Ui, state: &mut GuiState, busy: bool) -> ActionPanel {
    let mut panel = ActionPanel::default();
    section(ui, "Export");

    let has_players = !state.session.ledger().is_empty();
    ui.horizontal(|ui| {
        ui.add_enabled_ui(has_players, |ui| {
            panel.export_summary = ui.button("Summary CSV").clicked();
            panel.export_table = ui.button("Table PNG").clicked();
            panel.export_json = ui.button("JSON").clicked();
        });
        ui.add_enabled_ui(has_detail_rows(&state.session), |ui| {
            panel.export_detail = ui.button("Detail CSV").clicked();
        });

        ui.add_space(20.0);
        ui.add_enabled_ui(state.last_export.is_some(), |ui| {
            panel.open_exports = ui.button("Open exports folder").clicked();
        });
    });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.add_enabled_ui(!busy, |ui| {
            let label = if state.confirm_reset {
                RichText::new("Click again to reset the league").color(Color32::from_rgb(200, 0, 0))
            } else {
                RichText::new("Reset league")
            };
            if ui.button(label).clicked() {
                if state.confirm_reset {
                    panel.reset = true;
                } else {
                    state.confirm_reset = true;
                }
            }
        });
        if busy {
            ui.label(RichText::new("Reset is disabled while races are processing").color(Color32::GRAY));
        }
    });

    panel
}

/// Render notifications stacked in the bottom-right corner.
pub fn render_toasts(ctx: &egui::Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .show(ctx, |ui| {
            for toast in toasts {
                let color = match toast.kind {
                    ToastKind::Info => Color32::from_rgb(0, 120, 200),
                    ToastKind::Success => Color32::from_rgb(0, 150, 0),
                    ToastKind::Error => Color32::from_rgb(200, 0, 0),
                };
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(360.0);
                    ui.label(RichText::new(&toast.message).color(color));
                });
                ui.add_space(4.0);
            }
        });
}
