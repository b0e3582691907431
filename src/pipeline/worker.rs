//! Extraction worker thread.
//!
//! Receives race jobs from the GUI and processes them one at a time. A job
//! that fails with an overload signal goes to the back of the local queue with
//! a backoff deadline; any other failure is reported as an empty result for
//! that race and the worker moves on.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::Instant;

use super::queue::{RaceJob, WorkerEvent};
use super::retry::RetryPolicy;
use crate::extraction::{Extractor, extract_race};
use crate::league::RaceResult;

/// Runs the worker loop.
///
/// Processes jobs until the job channel closes and the local queue is empty,
/// or until nobody listens for events any more. Blocks, so it should be run
/// in a dedicated thread.
pub fn run_extraction_worker(
    jobs: Receiver<RaceJob>,
    events: Sender<WorkerEvent>,
    extractor: Box<dyn Extractor>,
    policy: RetryPolicy,
    max_dimension: u32,
) {
    crate::log("Extraction worker started");

    let mut pending: VecDeque<RaceJob> = VecDeque::new();
    let mut open = true;

    loop {
        // Take in everything submitted so far without blocking
        while open {
            match jobs.try_recv() {
                Ok(job) => pending.push_back(job),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => open = false,
            }
        }

        let job = match pending.pop_front() {
            Some(job) => job,
            None if open => match jobs.recv() {
                Ok(job) => job,
                Err(_) => break,
            },
            None => break,
        };

        match process_job(job, extractor.as_ref(), &policy, max_dimension, &events) {
            Ok(Some(retry)) => pending.push_back(retry),
            Ok(None) => {}
            Err(()) => {
                crate::log("Extraction worker: event channel closed, exiting");
                return;
            }
        }
    }

    crate::log("Extraction worker finished");
}

/// Runs one attempt. Returns the job back when it should be retried, or
/// `Err(())` when the event receiver is gone.
fn process_job(
    mut job: RaceJob,
    extractor: &dyn Extractor,
    policy: &RetryPolicy,
    max_dimension: u32,
    events: &Sender<WorkerEvent>,
) -> Result<Option<RaceJob>, ()> {
    if let Some(deadline) = job.not_before {
        let wait = deadline.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }

    job.attempts += 1;
    let source = job.source_name();
    crate::log(&format!(
        "Extraction worker: race {} ({}), attempt {}/{}",
        job.race, source, job.attempts, policy.max_attempts
    ));
    send(events, WorkerEvent::Started {
        race: job.race,
        source: source.clone(),
        attempt: job.attempts,
    })?;

    match extract_race(extractor, &job.image_path, job.race, &job.hints, max_dimension) {
        Ok(rows) => {
            send(events, WorkerEvent::Completed(RaceResult::new(source, job.race, rows)))?;
            Ok(None)
        }
        Err(e) if policy.should_retry(job.attempts, &e) => {
            let delay = policy.backoff(job.attempts);
            crate::log(&format!(
                "Extraction worker: race {} overloaded ({}), retrying in {:.1}s",
                job.race,
                e,
                delay.as_secs_f32()
            ));
            send(events, WorkerEvent::Retrying {
                race: job.race,
                source,
                attempt: job.attempts,
                delay,
                error: e.to_string(),
            })?;
            job.not_before = Some(Instant::now() + delay);
            Ok(Some(job))
        }
        Err(e) => {
            crate::log(&format!(
                "Extraction worker: race {} failed after {} attempt(s): {}",
                job.race, job.attempts, e
            ));
            let error = e.to_string();
            send(events, WorkerEvent::Failed {
                result: RaceResult::failed(source, job.race, error.clone()),
                error,
            })?;
            Ok(None)
        }
    }
}

fn send(events: &Sender<WorkerEvent>, event: WorkerEvent) -> Result<(), ()> {
    events.send(event).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{EncodedImage, ExtractionError};
    use crate::league::{ExtractedRow, RaceNumber};
    use crate::pipeline::queue::{create_event_queue, create_job_queue};
    use image::{ImageBuffer, Rgba};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    /// Replays scripted outcomes per race, then succeeds.
    struct ScriptedExtractor {
        script: Mutex<HashMap<u8, VecDeque<Result<Vec<ExtractedRow>, ExtractionError>>>>,
        calls: Arc<Mutex<Vec<u8>>>,
    }

    impl ScriptedExtractor {
        fn new(calls: Arc<Mutex<Vec<u8>>>) -> Self {
            Self {
                script: Mutex::new(HashMap::new()),
                calls,
            }
        }

        fn then(self, race: u8, outcome: Result<Vec<ExtractedRow>, ExtractionError>) -> Self {
            self.script
                .lock()
                .unwrap()
                .entry(race)
                .or_default()
                .push_back(outcome);
            self
        }
    }

    impl Extractor for ScriptedExtractor {
        fn extract(
            &self,
            _image: &EncodedImage,
            race: RaceNumber,
            _hints: &[String],
        ) -> Result<Vec<ExtractedRow>, ExtractionError> {
            self.calls.lock().unwrap().push(race.get());
            self.script
                .lock()
                .unwrap()
                .get_mut(&race.get())
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Ok(vec![ExtractedRow::new(&format!("P{}", race), "", 0, "1st")])
                })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn write_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        ImageBuffer::from_pixel(4, 4, Rgba([0u8, 0, 0, 255])).save(&path).unwrap();
        path
    }

    fn run(extractor: ScriptedExtractor, races: &[u8]) -> (Vec<WorkerEvent>, TempDir) {
        let dir = tempdir().unwrap();
        let (job_tx, job_rx) = create_job_queue();
        let (event_tx, event_rx) = create_event_queue();

        for &race in races {
            let path = write_image(dir.path(), &format!("race{}.png", race));
            job_tx
                .send(RaceJob::new(path, RaceNumber::new(race).unwrap(), Vec::new()))
                .unwrap();
        }
        drop(job_tx);

        run_extraction_worker(job_rx, event_tx, Box::new(extractor), fast_policy(), 64);
        (event_rx.try_iter().collect(), dir)
    }

    fn finished_races(events: &[WorkerEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                WorkerEvent::Completed(result) => Some(result.race.get()),
                WorkerEvent::Failed { result, .. } => Some(result.race.get()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_worker_exits_when_channel_closes() {
        let (job_tx, job_rx) = create_job_queue();
        let (event_tx, _event_rx) = create_event_queue();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let handle = thread::spawn(move || {
            run_extraction_worker(
                job_rx,
                event_tx,
                Box::new(ScriptedExtractor::new(calls)),
                fast_policy(),
                64,
            );
        });

        drop(job_tx);
        handle.join().expect("Worker thread panicked");
    }

    #[test]
    fn test_processes_jobs_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (events, _dir) = run(ScriptedExtractor::new(calls.clone()), &[1, 2, 3]);

        assert_eq!(finished_races(&events), vec![1, 2, 3]);
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_transient_failure_requeued_at_back() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let extractor = ScriptedExtractor::new(calls.clone())
            .then(1, Err(ExtractionError::Transient("overloaded".into())));
        let (events, _dir) = run(extractor, &[1, 2]);

        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 1]);
        assert_eq!(finished_races(&events), vec![2, 1]);
        assert!(events.iter().any(|e| matches!(e, WorkerEvent::Retrying { attempt: 1, .. })));
        assert!(events.iter().any(|e| matches!(e, WorkerEvent::Completed(r) if r.race.get() == 1)));
    }

    #[test]
    fn test_retries_exhausted_records_empty_result() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let overload = || Err(ExtractionError::Transient("503".into()));
        let extractor = ScriptedExtractor::new(calls.clone())
            .then(1, overload())
            .then(1, overload())
            .then(1, overload());
        let (events, _dir) = run(extractor, &[1]);

        assert_eq!(calls.lock().unwrap().len(), 3);
        match events.last() {
            Some(WorkerEvent::Failed { result, .. }) => {
                assert!(result.rows.is_empty());
                assert!(result.error.is_some());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_fatal_failure_not_retried_and_batch_continues() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let extractor = ScriptedExtractor::new(calls.clone())
            .then(1, Err(ExtractionError::Fatal("bad request".into())));
        let (events, _dir) = run(extractor, &[1, 2]);

        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
        assert_eq!(finished_races(&events), vec![1, 2]);
        assert!(matches!(events.iter().find(|e| matches!(e, WorkerEvent::Failed { .. })),
            Some(WorkerEvent::Failed { error, .. }) if error.contains("bad request")));
    }

    #[test]
    fn test_missing_image_is_fatal() {
        let (job_tx, job_rx) = create_job_queue();
        let (event_tx, event_rx) = create_event_queue();
        job_tx
            .send(RaceJob::new(PathBuf::from("/nonexistent/race.png"), RaceNumber::FIRST, Vec::new()))
            .unwrap();
        drop(job_tx);

        let calls = Arc::new(Mutex::new(Vec::new()));
        run_extraction_worker(
            job_rx,
            event_tx,
            Box::new(ScriptedExtractor::new(calls.clone())),
            fast_policy(),
            64,
        );

        assert!(calls.lock().unwrap().is_empty());
        let events: Vec<WorkerEvent> = event_rx.try_iter().collect();
        assert!(matches!(events.last(), Some(WorkerEvent::Failed { .. })));
    }
}
