//! Background training jobs
//!
//! Training is CPU-bound and single-threaded from the caller's point of
//! view; this module hosts it on a dedicated thread behind a message-passing
//! job abstraction so a UI or request handler stays responsive. A job emits
//! progress events followed by exactly one terminal event, and never exposes
//! a partially built artifact.

use crate::dataset::Dataset;
use crate::error::{ChurnError, Result};
use crate::training::{TrainEngine, TrainingConfig, TrainingOutcome, TrainingPhase};
use parking_lot::Mutex;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Events emitted by a training job, in order: zero or more `Progress`
/// checkpoints, then exactly one `Completed` or `Failed`.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(TrainingPhase),
    Completed(Box<TrainingOutcome>),
    Failed(String),
}

/// A training run executing on its own thread.
pub struct TrainingJob;

impl TrainingJob {
    /// Start training on a background thread. The dataset is moved into the
    /// job; concurrent jobs share nothing.
    pub fn spawn(config: TrainingConfig, dataset: Dataset) -> JobHandle {
        let (tx, rx) = channel();
        let latest: Arc<Mutex<Option<TrainingPhase>>> = Arc::new(Mutex::new(None));

        let sender = Arc::new(Mutex::new(tx));
        let latest_writer = Arc::clone(&latest);
        let progress_sender = Arc::clone(&sender);

        let thread = thread::spawn(move || {
            let engine = TrainEngine::new(config);
            let result = engine.train_with_progress(&dataset, |phase| {
                *latest_writer.lock() = Some(phase);
                // The receiver may be gone; progress is advisory either way
                let _ = progress_sender.lock().send(JobEvent::Progress(phase));
            });

            let terminal = match result {
                Ok(outcome) => JobEvent::Completed(Box::new(outcome)),
                Err(err) => JobEvent::Failed(err.to_string()),
            };
            debug!(
                failed = matches!(terminal, JobEvent::Failed(_)),
                "training job finished"
            );
            let _ = sender.lock().send(terminal);
        });

        JobHandle {
            events: rx,
            latest,
            thread: Some(thread),
        }
    }
}

/// Caller-side handle to a running training job. Dropping the handle
/// detaches the job; the thread finishes on its own.
pub struct JobHandle {
    events: Receiver<JobEvent>,
    latest: Arc<Mutex<Option<TrainingPhase>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl JobHandle {
    /// Receiver for the job's event stream.
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Snapshot of the most recent progress checkpoint.
    pub fn latest_stage(&self) -> Option<TrainingPhase> {
        *self.latest.lock()
    }

    /// Block until the job reaches its terminal event and return the
    /// outcome. Progress events still queued are drained along the way.
    pub fn join(mut self) -> Result<TrainingOutcome> {
        let mut outcome = Err(ChurnError::TrainingError(
            "training worker terminated without a result".to_string(),
        ));
        for event in self.events.iter() {
            match event {
                JobEvent::Progress(_) => continue,
                JobEvent::Completed(done) => {
                    outcome = Ok(*done);
                    break;
                }
                JobEvent::Failed(message) => {
                    outcome = Err(ChurnError::TrainingError(message));
                    break;
                }
            }
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }
}
