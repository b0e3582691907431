//! Job queue between the GUI and the extraction worker.
//!
//! Uses std::sync::mpsc channels: the GUI sends race jobs, the worker sends
//! progress events back.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use crate::league::{RaceNumber, RaceResult};

/// One scoreboard image waiting for extraction.
#[derive(Debug, Clone)]
pub struct RaceJob {
    /// Path to the uploaded image
    pub image_path: PathBuf,
    /// Race number assigned at upload
    pub race: RaceNumber,
    /// Expected player names passed to the extractor
    pub hints: Vec<String>,
    /// Attempts made so far
    pub attempts: u32,
    /// Earliest time the next attempt may start
    pub not_before: Option<Instant>,
    pub queued_at: DateTime<Local>,
}

impl RaceJob {
    pub fn new(image_path: PathBuf, race: RaceNumber, hints: Vec<String>) -> Self {
        Self {
            image_path,
            race,
            hints,
            attempts: 0,
            not_before: None,
            queued_at: Local::now(),
        }
    }

    /// File name shown in the UI and recorded as the race source.
    pub fn source_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_path.display().to_string())
    }
}

/// Progress reported by the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Started {
        race: RaceNumber,
        source: String,
        attempt: u32,
    },
    /// A transient failure; the job went to the back of the queue
    Retrying {
        race: RaceNumber,
        source: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    Completed(RaceResult),
    /// Extraction gave up; `result` is the empty result recorded for the race
    Failed { result: RaceResult, error: String },
}

/// Creates the GUI → worker job channel.
pub fn create_job_queue() -> (Sender<RaceJob>, Receiver<RaceJob>) {
    channel()
}

/// Creates the worker → GUI event channel.
pub fn create_event_queue() -> (Sender<WorkerEvent>, Receiver<WorkerEvent>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_queue_preserves_order() {
        let (sender, receiver) = create_job_queue();

        for i in 1..=5u8 {
            let job = RaceJob::new(
                PathBuf::from(format!("race_{}.png", i)),
                RaceNumber::new(i).unwrap(),
                Vec::new(),
            );
            sender.send(job).expect("Failed to send");
        }

        for i in 1..=5u8 {
            let received = receiver.recv().expect("Failed to receive");
            assert_eq!(received.race.get(), i);
            assert_eq!(received.attempts, 0);
        }
    }

    #[test]
    fn test_channel_closes_when_sender_dropped() {
        let (sender, receiver) = create_job_queue();
        sender
            .send(RaceJob::new(PathBuf::from("a.png"), RaceNumber::FIRST, Vec::new()))
            .unwrap();
        drop(sender);

        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }

    #[test]
    fn test_source_name() {
        let job = RaceJob::new(PathBuf::from("uploads/race_03.jpg"), RaceNumber::FIRST, Vec::new());
        assert_eq!(job.source_name(), "race_03.jpg");
    }
}
