use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use rand::Rng;

use crate::{
    config,
    domain::{
        outcome::{ProcessingOutcome, RunSummary},
        track::TrackReference,
    },
    pipeline::processor::Process,
};

/// Throttles consecutive requests to the remote services
pub trait Pacer {
    fn next_delay(&mut self) -> Duration;
    fn wait(&mut self, delay: Duration);
}

/// Sleeps for a duration drawn uniformly from `[min_secs, max_secs]`
pub struct RandomPacer {
    min_secs: f64,
    max_secs: f64,
}

impl RandomPacer {
    pub fn new(config: config::Pacing) -> Self {
        Self {
            min_secs: config.min_secs,
            max_secs: config.max_secs,
        }
    }
}

impl Pacer for RandomPacer {
    fn next_delay(&mut self) -> Duration {
        let secs = if self.min_secs < self.max_secs {
            rand::rng().random_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }

    fn wait(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Runs a processor over an ordered list of references, one at a time
pub struct BatchRunner<P, S> {
    processor: P,
    pacer: S,
}

impl<P: Process, S: Pacer> BatchRunner<P, S> {
    pub fn new(processor: P, pacer: S) -> Self {
        Self { processor, pacer }
    }

    /// Processes every reference in order. A single item never aborts the
    /// run, not even by panicking.
    pub fn run(&mut self, references: &[TrackReference]) -> RunSummary {
        let total = references.len();
        let mut summary = RunSummary::new(total);

        for (i, reference) in references.iter().enumerate() {
            log::info!("Processing [{}/{}]: {}", i + 1, total, reference);

            let outcome = self.process_isolated(reference);
            match &outcome {
                ProcessingOutcome::Success { title, .. } => {
                    log::info!("Successfully downloaded: {title}")
                }
                ProcessingOutcome::Failure { message, .. } => {
                    log::warn!("Failed {reference}: {message}")
                }
            }
            summary.record(outcome);

            if i + 1 < total {
                let delay = self.pacer.next_delay();
                log::info!(
                    "Waiting {:.1} seconds before next download...",
                    delay.as_secs_f64()
                );
                self.pacer.wait(delay);
            }
        }

        summary.finish();
        debug_assert!(summary.is_complete());
        summary
    }

    fn process_isolated(&mut self, reference: &TrackReference) -> ProcessingOutcome {
        let processor = &mut self.processor;
        panic::catch_unwind(AssertUnwindSafe(|| processor.process(reference))).unwrap_or_else(
            |payload| ProcessingOutcome::Failure {
                reference: reference.clone(),
                message: format!("unexpected error: {}", panic_message(payload.as_ref())),
            },
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
