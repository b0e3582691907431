//! Background extraction pipeline.
//!
//! This module provides:
//! - Application configuration (config.json)
//! - Job and event queues between the GUI and the worker
//! - Bounded retry with exponential backoff for overload failures
//! - The sequential extraction worker thread
//! - Re-ordering of finished races before they are merged

pub mod config;
pub mod queue;
pub mod retry;
pub mod runner;
pub mod sequencer;
pub mod worker;

pub use config::{AppConfig, get_config, init_config};
pub use queue::{RaceJob, WorkerEvent};
pub use retry::RetryPolicy;
pub use runner::{Assignment, Pipeline, PollOutcome, assign_race_numbers};
