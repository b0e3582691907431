//! Pipeline handle owned by the GUI.
//!
//! Spawns the extraction worker thread, submits jobs to it and collects its
//! events, passing finished races through the sequencer so the caller only
//! ever sees them in merge order.

use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::config::AppConfig;
use super::queue::{RaceJob, WorkerEvent, create_event_queue, create_job_queue};
use super::retry::RetryPolicy;
use super::sequencer::RaceSequencer;
use super::worker::run_extraction_worker;
use crate::extraction::{Extractor, GeminiExtractor};
use crate::league::{RaceNumber, RaceResult};
use crate::league::race::RACES_PER_LEAGUE;

/// What one `poll` collected.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Raw worker events, for status display
    pub events: Vec<WorkerEvent>,
    /// Results ready to merge, in race order
    pub ready: Vec<RaceResult>,
}

pub struct Pipeline {
    jobs: Option<Sender<RaceJob>>,
    events: Receiver<WorkerEvent>,
    worker: Option<JoinHandle<()>>,
    sequencer: RaceSequencer,
}

impl Pipeline {
    /// Starts the worker thread with the given extractor.
    pub fn start(extractor: Box<dyn Extractor>, policy: RetryPolicy, max_dimension: u32) -> Self {
        let (job_tx, job_rx) = create_job_queue();
        let (event_tx, event_rx) = create_event_queue();

        let worker = thread::spawn(move || {
            run_extraction_worker(job_rx, event_tx, extractor, policy, max_dimension);
        });

        Self {
            jobs: Some(job_tx),
            events: event_rx,
            worker: Some(worker),
            sequencer: RaceSequencer::new(),
        }
    }

    /// Starts the worker with the hosted extractor described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let extractor = GeminiExtractor::from_config(config)?;
        Ok(Self::start(
            Box::new(extractor),
            RetryPolicy::from_config(config),
            config.max_image_dimension,
        ))
    }

    pub fn submit(&mut self, job: RaceJob) -> Result<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| anyhow!("Extraction worker has been shut down"))?;
        let race = job.race;
        crate::log(&format!("Queued race {} ({})", race, job.source_name()));
        jobs.send(job)
            .map_err(|_| anyhow!("Extraction worker is not running"))?;
        self.sequencer.expect(race);
        Ok(())
    }

    /// Drains pending worker events without blocking.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    match &event {
                        WorkerEvent::Completed(result) | WorkerEvent::Failed { result, .. } => {
                            outcome.ready.extend(self.sequencer.push(result.clone()));
                        }
                        _ => {}
                    }
                    outcome.events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.jobs.is_some() && !self.sequencer.is_idle() {
                        crate::log("Extraction worker stopped unexpectedly");
                    }
                    break;
                }
            }
        }
        outcome
    }

    /// Whether any submitted race has not been handed back yet.
    pub fn is_busy(&self) -> bool {
        !self.sequencer.is_idle()
    }

    pub fn in_flight(&self) -> usize {
        self.sequencer.outstanding()
    }

    /// Closes the job channel and waits for the worker to drain its queue.
    pub fn shutdown(&mut self) {
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            crate::log("Waiting for extraction worker to finish...");
            if let Err(e) = worker.join() {
                crate::log(&format!("Extraction worker thread panicked: {:?}", e));
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Dropping the sender lets the worker exit; don't block the UI on it
        self.jobs = None;
    }
}

/// Uploads split into those that got a race number and those refused.
#[derive(Debug, Default, PartialEq)]
pub struct Assignment {
    pub accepted: Vec<(PathBuf, RaceNumber)>,
    pub refused: Vec<PathBuf>,
}

/// Gives uploads consecutive race numbers starting at `next`, in upload
/// order. Anything past race 12 is refused.
pub fn assign_race_numbers(uploads: Vec<PathBuf>, next: Option<RaceNumber>) -> Assignment {
    let mut assignment = Assignment::default();
    let mut race = next;
    for path in uploads {
        match race {
            Some(number) => {
                assignment.accepted.push((path, number));
                race = number.next();
            }
            None => assignment.refused.push(path),
        }
    }
    if !assignment.refused.is_empty() {
        crate::log(&format!(
            "Refused {} upload(s): the league only has {} races",
            assignment.refused.len(),
            RACES_PER_LEAGUE
        ));
    }
    assignment
}
