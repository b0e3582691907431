//! GUI module for the application.
//!
//! Provides a graphical interface using egui/eframe: league settings,
//! screenshot upload, race history, the league table with shock toggles,
//! renaming, exports and notifications.

pub mod render;
pub mod state;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Vec2};

use crate::league::{RaceNumber, TeamConfig};
use crate::pipeline::{Pipeline, RaceJob, assign_race_numbers, get_config};
use crate::report::{self, ChartConfig};
use crate::storage::StateStore;

use state::{GuiState, ProcessingStatus, ToastKind, is_image_path, list_images_in_folder};

/// Main GUI application struct.
pub struct GuiApp {
    /// Application state.
    state: GuiState,
    /// Extraction worker, `None` if it could not be started
    pipeline: Option<Pipeline>,
    store: StateStore,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::setup_fonts(&cc.egui_ctx);

        let config = get_config();
        let store = StateStore::for_namespace(&config.storage_namespace);
        let mut state = GuiState::new(store.load());

        let pipeline = match Pipeline::from_config(config) {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                state.notify(ToastKind::Error, format!("Extraction unavailable: {}", e));
                None
            }
        };

        Self {
            state,
            pipeline,
            store,
        }
    }

    /// Adds a CJK-capable system font as fallback so scoreboard names render.
    fn setup_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        let font_paths = [
            "C:\\Windows\\Fonts\\YuGothM.ttc",
            "C:\\Windows\\Fonts\\meiryo.ttc",
            "C:\\Windows\\Fonts\\msgothic.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        ];

        for font_path in &font_paths {
            if let Ok(font_data) = std::fs::read(font_path) {
                fonts.font_data.insert(
                    "cjk_font".to_owned(),
                    egui::FontData::from_owned(font_data),
                );

                // Fallback after the default fonts
                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    fonts
                        .families
                        .entry(family)
                        .or_default()
                        .push("cjk_font".to_owned());
                }

                crate::log(&format!("Loaded fallback font from: {}", font_path));
                ctx.set_fonts(fonts);
                return;
            }
        }

        crate::log("Warning: Could not load a CJK font. Some names may not display correctly.");
    }

    fn save(&mut self) {
        if let Err(e) = self.store.save(&self.state.session) {
            self.state
                .notify(ToastKind::Error, format!("Failed to save league: {:#}", e));
        }
    }

    /// Collect worker events and merge finished races in order.
    fn poll_pipeline(&mut self) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        let outcome = pipeline.poll();
        let busy = pipeline.is_busy();

        for event in &outcome.events {
            self.state.apply_event(event);
        }

        let merged = !outcome.ready.is_empty();
        for result in outcome.ready {
            self.state.session.apply_race(result);
        }
        if merged {
            self.save();
        }

        if !busy {
            self.state.status = ProcessingStatus::Idle;
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.handle_upload(dropped);
        }
    }

    /// Assign race numbers in upload order and queue the screenshots.
    fn handle_upload(&mut self, paths: Vec<PathBuf>) {
        let (images, skipped): (Vec<PathBuf>, Vec<PathBuf>) =
            paths.into_iter().partition(|path| is_image_path(path));
        if !skipped.is_empty() {
            self.state.notify(
                ToastKind::Info,
                format!("Ignored {} file(s) that are not images", skipped.len()),
            );
        }
        if images.is_empty() {
            return;
        }

        let assignment = assign_race_numbers(images, self.state.next_upload_race());
        if !assignment.refused.is_empty() {
            self.state.notify(
                ToastKind::Error,
                format!(
                    "{} screenshot(s) refused: all 12 races are already assigned",
                    assignment.refused.len()
                ),
            );
        }

        for (path, race) in assignment.accepted {
            self.submit(path, race);
        }
    }

    fn submit(&mut self, path: PathBuf, race: RaceNumber) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            self.state
                .notify(ToastKind::Error, "Extraction is unavailable; check the log");
            return;
        };
        let job = RaceJob::new(path, race, self.state.session.hint_names());
        match pipeline.submit(job) {
            Ok(()) => self.state.record_submitted(race),
            Err(e) => self
                .state
                .notify(ToastKind::Error, format!("Race {} not queued: {}", race, e)),
        }
    }

    fn handle_load_folder(&mut self) {
        let folder = PathBuf::from(self.state.folder_path.trim());
        match list_images_in_folder(&folder) {
            Ok(images) if images.is_empty() => self
                .state
                .notify(ToastKind::Info, format!("No images in {}", folder.display())),
            Ok(images) => self.handle_upload(images),
            Err(e) => self.state.notify(ToastKind::Error, format!("{:#}", e)),
        }
    }

    fn handle_reprocess(&mut self) {
        let path = PathBuf::from(self.state.reprocess_path.trim());
        let Some(race) = RaceNumber::new(self.state.reprocess_race) else {
            return;
        };
        if !path.is_file() {
            self.state.notify(
                ToastKind::Error,
                format!("Screenshot not found: {}", path.display()),
            );
            return;
        }
        self.submit(path, race);
    }

    fn handle_apply_teams(&mut self) {
        let edits: [TeamConfig; 2] = self.state.team_edits.clone();
        if edits[0].color == edits[1].color {
            self.state
                .notify(ToastKind::Error, "The two teams need different colors");
            return;
        }
        for (index, team) in edits.into_iter().enumerate() {
            self.state.session.set_team(index, team);
        }
        self.save();
    }

    fn handle_apply_roster(&mut self) {
        match self.state.session.set_roster_text(&self.state.roster_text) {
            Ok(count) => {
                self.state.roster_text = self.state.session.roster().join("\n");
                self.state
                    .notify(ToastKind::Success, format!("Roster saved ({} names)", count));
                self.save();
            }
            Err(e) => self.state.notify(ToastKind::Error, e.to_string()),
        }
    }

    fn handle_rename(&mut self) {
        let from = self.state.rename_from.clone();
        let to = self.state.rename_to.trim().to_string();
        match self.state.session.rename_player(&from, &to) {
            Ok(()) => {
                self.state
                    .notify(ToastKind::Success, format!("Renamed {} to {}", from, to));
                self.state.roster_text = self.state.session.roster().join("\n");
                self.state.rename_from.clear();
                self.state.rename_to.clear();
                self.save();
            }
            Err(e) => self.state.notify(ToastKind::Error, e.to_string()),
        }
    }

    fn handle_toggle_shock(&mut self, race: RaceNumber, team_index: usize) {
        self.state.session.toggle_shock(race, team_index);
        self.save();
    }

    fn handle_reset(&mut self) {
        if self.pipeline.as_ref().is_some_and(Pipeline::is_busy) {
            self.state
                .notify(ToastKind::Error, "Wait for processing to finish before resetting");
            return;
        }
        self.state.reset_league();
        self.state.notify(ToastKind::Info, "League reset");
        self.save();
    }

    fn handle_export(&mut self, panel: &render::ActionPanel) {
        let dir = crate::paths::get_exports_dir();
        let session = &self.state.session;

        let result = if panel.export_summary {
            report::export_summary_csv(session, &dir)
        } else if panel.export_detail {
            report::export_detail_csv(session, &dir)
        } else if panel.export_table {
            let config = ChartConfig::load(&crate::paths::get_chart_config_path());
            report::export_table_png(session, &dir, &config).map(Some)
        } else if panel.export_json {
            report::export_json(session, &dir).map(Some)
        } else {
            return;
        };

        match result {
            Ok(Some(path)) => {
                self.state
                    .notify(ToastKind::Success, format!("Exported {}", path.display()));
                self.state.last_export = Some(path);
            }
            Ok(None) => self.state.notify(ToastKind::Info, "Nothing to export yet"),
            Err(e) => self
                .state
                .notify(ToastKind::Error, format!("Export failed: {:#}", e)),
        }
    }

    /// Open the exports folder in the platform file manager.
    fn handle_open_exports(&self) {
        let dir = crate::paths::get_exports_dir();
        if let Err(e) = open_in_file_manager(&dir) {
            crate::log(&format!("GUI: Failed to open folder: {}", e));
        }
    }
}

fn open_in_file_manager(dir: &Path) -> std::io::Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(program).arg(dir).spawn().map(|_| ())
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pipeline();
        self.handle_dropped_files(ctx);
        self.state.drop_expired_toasts(Instant::now());

        // Keep polling while the worker has something in hand
        let busy = self.pipeline.as_ref().is_some_and(Pipeline::is_busy);
        if busy || !self.state.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.state.session.title);

            egui::ScrollArea::vertical().show(ui, |ui| {
                let settings = render::render_settings(ui, &mut self.state);
                if settings.apply_teams {
                    self.handle_apply_teams();
                }
                if settings.apply_roster {
                    self.handle_apply_roster();
                }

                let upload = render::render_upload(ui, &mut self.state);
                let in_flight = self.pipeline.as_ref().map_or(0, Pipeline::in_flight);
                render::render_status(ui, &self.state.status, in_flight);
                if upload.load_folder {
                    self.handle_load_folder();
                }
                if upload.reprocess {
                    self.handle_reprocess();
                }

                if let Some((race, team)) = render::render_ledger(ui, &self.state.session) {
                    self.handle_toggle_shock(race, team);
                }
                if render::render_rename(ui, &mut self.state) {
                    self.handle_rename();
                }

                render::render_race_history(ui, &self.state.session);

                let actions = render::render_actions(ui, &mut self.state, busy);
                self.handle_export(&actions);
                if actions.open_exports {
                    self.handle_open_exports();
                }
                if actions.reset {
                    self.handle_reset();
                }
            });
        });

        render::render_toasts(ctx, &self.state.toasts);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save();
        // Only wait for the worker when it has nothing left to do
        if let Some(pipeline) = self.pipeline.as_mut() {
            if pipeline.is_busy() {
                crate::log("GUI: Exiting with races still pending");
            } else {
                pipeline.shutdown();
            }
        }
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui() -> eframe::Result<()> {
    crate::log("GUI: Creating native options...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(1280.0, 820.0))
            .with_min_inner_size(Vec2::new(720.0, 480.0))
            .with_title("Raceboard")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    crate::log("GUI: Calling eframe::run_native...");

    eframe::run_native(
        "Raceboard",
        options,
        Box::new(|cc| {
            crate::log("GUI: Creating GuiApp instance...");
            Ok(Box::new(GuiApp::new(cc)))
        }),
    )
}
