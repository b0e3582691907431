//! GUI application state management.
//!
//! Holds the league session, the user's in-progress form input, extraction
//! progress and the notification list.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::league::{LeagueSession, RaceNumber, TeamConfig};
use crate::pipeline::WorkerEvent;

/// How long a notification stays on screen.
const TOAST_LIFETIME: Duration = Duration::from_secs(6);

/// File extensions accepted as scoreboard screenshots.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= TOAST_LIFETIME
    }
}

/// Extraction progress for display in GUI.
#[derive(Clone, Debug, Default)]
pub enum ProcessingStatus {
    /// Nothing submitted or everything merged
    #[default]
    Idle,
    /// The worker is reading a screenshot
    Extracting {
        race: RaceNumber,
        source: String,
        attempt: u32,
    },
    /// The service was overloaded; the race waits at the back of the queue
    Backoff {
        race: RaceNumber,
        attempt: u32,
        until: Instant,
    },
}

impl ProcessingStatus {
    /// Get display text for current status.
    pub fn status_text(&self, now: Instant) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Extracting { race, source, attempt } if *attempt > 1 => {
                format!("Reading race {} ({}), attempt {}", race, source, attempt)
            }
            Self::Extracting { race, source, .. } => format!("Reading race {} ({})", race, source),
            Self::Backoff { race, attempt, until } => {
                let remaining = until.saturating_duration_since(now).as_secs_f32();
                format!(
                    "Service busy, race {} retries in {:.0}s (attempt {} failed)",
                    race, remaining, attempt
                )
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// GUI application state.
#[derive(Debug)]
pub struct GuiState {
    pub session: LeagueSession,
    /// Roster text box contents
    pub roster_text: String,
    /// Team settings being edited
    pub team_edits: [TeamConfig; 2],
    /// Folder path text box for batch uploads
    pub folder_path: String,
    /// Race chosen for re-processing
    pub reprocess_race: u8,
    /// Screenshot path for re-processing
    pub reprocess_path: String,
    pub rename_from: String,
    pub rename_to: String,
    /// Highest race number handed to the worker this league
    pub highest_submitted: Option<RaceNumber>,
    pub status: ProcessingStatus,
    pub toasts: Vec<Toast>,
    /// Reset needs a second click to confirm
    pub confirm_reset: bool,
    pub last_export: Option<PathBuf>,
}

impl GuiState {
    pub fn new(session: LeagueSession) -> Self {
        Self {
            roster_text: session.roster().join("\n"),
            team_edits: session.teams().clone(),
            folder_path: String::new(),
            reprocess_race: 1,
            reprocess_path: String::new(),
            rename_from: String::new(),
            rename_to: String::new(),
            highest_submitted: session.races().iter().map(|r| r.race).max(),
            status: ProcessingStatus::Idle,
            toasts: Vec::new(),
            confirm_reset: false,
            last_export: None,
            session,
        }
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        crate::log(&format!("GUI: {}", message));
        self.toasts.push(Toast {
            message,
            kind,
            created: Instant::now(),
        });
    }

    pub fn drop_expired_toasts(&mut self, now: Instant) {
        self.toasts.retain(|toast| !toast.is_expired(now));
    }

    /// Race number the next upload gets: after both the highest processed
    /// race and anything already queued.
    pub fn next_upload_race(&self) -> Option<RaceNumber> {
        let after_submitted = match self.highest_submitted {
            Some(race) => race.next(),
            None => Some(RaceNumber::FIRST),
        };
        match (self.session.next_race_number(), after_submitted) {
            (Some(processed), Some(submitted)) => Some(processed.max(submitted)),
            _ => None,
        }
    }

    pub fn record_submitted(&mut self, race: RaceNumber) {
        self.highest_submitted = self.highest_submitted.max(Some(race));
    }

    /// Updates the status line from one worker event.
    pub fn apply_event(&mut self, event: &WorkerEvent) {
        match event {
            WorkerEvent::Started { race, source, attempt } => {
                self.status = ProcessingStatus::Extracting {
                    race: *race,
                    source: source.clone(),
                    attempt: *attempt,
                };
            }
            WorkerEvent::Retrying { race, attempt, delay, error, .. } => {
                self.status = ProcessingStatus::Backoff {
                    race: *race,
                    attempt: *attempt,
                    until: Instant::now() + *delay,
                };
                self.notify(
                    ToastKind::Info,
                    format!("Race {}: service busy, retrying ({})", race, error),
                );
            }
            WorkerEvent::Completed(result) => {
                let message = match result.invalid_count() {
                    0 => format!("Race {}: {} rows read", result.race, result.rows.len()),
                    n => format!(
                        "Race {}: {} rows read, {} without a name",
                        result.race,
                        result.rows.len(),
                        n
                    ),
                };
                self.notify(ToastKind::Success, message);
            }
            WorkerEvent::Failed { result, error } => {
                self.notify(
                    ToastKind::Error,
                    format!("Race {} ({}) could not be read: {}", result.race, result.source, error),
                );
            }
        }
    }

    /// Clears the league and everything derived from it in the UI.
    pub fn reset_league(&mut self) {
        self.session.reset();
        self.highest_submitted = None;
        self.status = ProcessingStatus::Idle;
        self.confirm_reset = false;
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Screenshots in a folder, sorted by file name.
pub fn list_images_in_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(folder)
        .with_context(|| format!("Failed to read folder: {}", folder.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::{ExtractedRow, RaceResult};
    use tempfile::tempdir;

    fn race(n: u8) -> RaceNumber {
        RaceNumber::new(n).unwrap()
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("race1.PNG")));
        assert!(is_image_path(Path::new("shots/race.jpeg")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("noext")));
    }

    #[test]
    fn test_list_images_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.jpg", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let images = list_images_in_folder(dir.path()).unwrap();
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_list_images_missing_folder() {
        assert!(list_images_in_folder(Path::new("/nonexistent/folder")).is_err());
    }

    #[test]
    fn test_next_upload_race_counts_queued_races() {
        let mut state = GuiState::new(LeagueSession::default());
        assert_eq!(state.next_upload_race(), Some(RaceNumber::FIRST));

        state.record_submitted(race(3));
        assert_eq!(state.next_upload_race(), Some(race(4)));

        // A re-processed earlier race doesn't move the counter back
        state.record_submitted(race(2));
        assert_eq!(state.next_upload_race(), Some(race(4)));

        state.record_submitted(race(12));
        assert_eq!(state.next_upload_race(), None);
    }

    #[test]
    fn test_next_upload_race_after_processed_races() {
        let mut session = LeagueSession::default();
        session.apply_race(RaceResult::new(
            "r5.png",
            race(5),
            vec![ExtractedRow::new("Alice", "", 0, "1st")],
        ));
        let state = GuiState::new(session);
        assert_eq!(state.next_upload_race(), Some(race(6)));
    }

    #[test]
    fn test_reset_league_clears_counter() {
        let mut state = GuiState::new(LeagueSession::default());
        state.record_submitted(race(4));
        state.confirm_reset = true;

        state.reset_league();
        assert_eq!(state.next_upload_race(), Some(RaceNumber::FIRST));
        assert!(!state.confirm_reset);
    }

    #[test]
    fn test_failed_event_notifies_error() {
        let mut state = GuiState::new(LeagueSession::default());
        state.apply_event(&WorkerEvent::Failed {
            result: RaceResult::failed("r1.png", RaceNumber::FIRST, "HTTP 403"),
            error: "HTTP 403".to_string(),
        });
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.toasts[0].kind, ToastKind::Error);
    }

    #[test]
    fn test_toasts_expire() {
        let mut state = GuiState::new(LeagueSession::default());
        state.notify(ToastKind::Info, "hello");
        let later = Instant::now() + TOAST_LIFETIME;
        state.drop_expired_toasts(later);
        assert!(state.toasts.is_empty());
    }

    #[test]
    fn test_backoff_status_text() {
        let now = Instant::now();
        let status = ProcessingStatus::Backoff {
            race: race(2),
            attempt: 1,
            until: now + Duration::from_secs(4),
        };
        assert!(status.status_text(now).contains("race 2 retries in 4s"));
        assert!(status.is_active());
    }
}
