//! Persisted league state.
//!
//! The whole session is written as one JSON document after every change and
//! read back once at startup. A file written by a different format version is
//! ignored and the league starts empty.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::league::LeagueSession;

/// Bumped whenever the stored layout changes incompatibly.
pub const STATE_VERSION: u32 = 1;

const STATE_FILE: &str = "league_state.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    version: u32,
    namespace: String,
    session: LeagueSession,
}

/// Reads and writes the session under one namespace.
#[derive(Debug, Clone)]
pub struct StateStore {
    namespace: String,
    path: PathBuf,
}

impl StateStore {
    /// Store at the platform data directory for `namespace`.
    pub fn for_namespace(namespace: &str) -> Self {
        let path = crate::paths::get_state_dir(namespace).join(STATE_FILE);
        Self::at(namespace, path)
    }

    pub fn at(namespace: &str, path: PathBuf) -> Self {
        Self {
            namespace: namespace.to_string(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved session, or a fresh one when nothing usable is stored.
    pub fn load(&self) -> LeagueSession {
        crate::log(&format!("Loading league state from {}", self.path.display()));

        if !self.path.exists() {
            crate::log("No saved league state. Starting a new league.");
            return LeagueSession::default();
        }

        match self.read() {
            Ok(state) if state.version != STATE_VERSION => {
                crate::log(&format!(
                    "Saved league state has version {} (expected {}). Starting a new league.",
                    state.version, STATE_VERSION
                ));
                LeagueSession::default()
            }
            Ok(state) => {
                if state.namespace != self.namespace {
                    crate::log(&format!(
                        "Saved league state belongs to namespace '{}', loading it anyway",
                        state.namespace
                    ));
                }
                crate::log(&format!(
                    "League state loaded: {} player(s), {} race(s)",
                    state.session.ledger().len(),
                    state.session.races().len()
                ));
                state.session
            }
            Err(e) => {
                crate::log(&format!(
                    "Failed to load league state: {:#}. Starting a new league.",
                    e
                ));
                LeagueSession::default()
            }
        }
    }

    fn read(&self) -> Result<StoredState> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse league state")
    }

    /// Writes the session, replacing what was stored before.
    pub fn save(&self, session: &LeagueSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let state = StoredState {
            version: STATE_VERSION,
            namespace: self.namespace.clone(),
            session: session.clone(),
        };
        let json = serde_json::to_string_pretty(&state).context("Failed to serialize league state")?;

        // Write to a sibling file first so a crash never leaves half a document
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
