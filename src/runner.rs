//! Driving a pipeline to completion.
//!
//! The runner owns the loop: pick the current step, clone the state in, act
//! on the outcome. Two limits keep a bad wiring or a stubborn model call from
//! running forever: `max_steps` bounds the whole run, `max_retries` bounds
//! how often one step may answer [`Outcome::Retry`] or [`Outcome::Backoff`]
//! before the run is abandoned. Hooks exist so a caller can watch a run
//! without threading observability through every step.

use crate::{Ctx, Outcome, Pipeline, StepError};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Passed to the `on_step` hook after each successful step.
pub struct StepEvent<'a> {
    pub step: &'a str,
    pub outcome: &'a Outcome,
    pub duration: Duration,
    pub step_number: usize,
    pub retries: usize,
}

/// Passed to the `on_error` hook whenever a run is about to end in an error.
pub struct ErrorEvent<'a> {
    pub step: &'a str,
    pub error: &'a StepError,
    pub step_number: usize,
}

pub struct Runner<S: Clone + 'static> {
    pipeline: Pipeline<S>,
    max_steps: usize,
    max_retries: usize,
    on_step: Option<Box<dyn FnMut(&StepEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl<S: Clone + 'static> Runner<S> {
    pub fn new(pipeline: Pipeline<S>) -> Self {
        Self {
            pipeline,
            max_steps: 10_000,
            max_retries: 3,
            on_step: None,
            on_error: None,
        }
    }

    /// Bound the total number of step executions in one run.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Bound how often a single step may retry or back off before the run
    /// is abandoned.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Watch successful steps.
    pub fn on_step(mut self, cb: impl FnMut(&StepEvent) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Watch failures, including limit trips.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Wire both hooks to stderr; handy for demos and debugging.
    pub fn with_tracing(self) -> Self {
        self.on_step(|e| {
            eprintln!(
                "[{:>3}] {} -> {:?} in {:.3}s",
                e.step_number,
                e.step,
                e.outcome,
                e.duration.as_secs_f64()
            );
        })
        .on_error(|e| {
            eprintln!("[{:>3}] {} failed: {}", e.step_number, e.step, e.error);
        })
    }

    // funnel for every failing exit so on_error sees each of them exactly once
    fn report(&mut self, step: &'static str, step_number: usize, err: StepError) -> StepError {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                step,
                error: &err,
                step_number,
            });
        }
        err
    }

    pub fn run(&mut self, mut state: S, ctx: &mut Ctx) -> Result<S, StepError> {
        let mut current = self.pipeline.start();
        let mut retries: usize = 0;
        let mut step_number: usize = 0;

        loop {
            if step_number == self.max_steps {
                let err = StepError::other(format!(
                    "pipeline '{}' hit the {}-step limit (possible routing loop)",
                    self.pipeline.name(),
                    self.max_steps
                ));
                return Err(self.report(current, step_number, err));
            }
            step_number += 1;

            let (result, duration) = match self.pipeline.step_mut(current) {
                Some(step) => {
                    let started = Instant::now();
                    let result = step.run(state.clone(), ctx);
                    (result, started.elapsed())
                }
                None => {
                    let err = StepError::other(format!("no step named '{current}' registered"));
                    return Err(self.report(current, step_number, err));
                }
            };

            let (next_state, outcome) = match result {
                Ok(pair) => pair,
                Err(err) => {
                    warn!("step '{current}' failed at step {step_number}: {err}");
                    return Err(self.report(current, step_number, err));
                }
            };

            debug!(
                "step '{current}' -> {outcome:?} ({:.3}s)",
                duration.as_secs_f64()
            );
            if let Some(cb) = &mut self.on_step {
                cb(&StepEvent {
                    step: current,
                    outcome: &outcome,
                    duration,
                    step_number,
                    retries,
                });
            }

            state = next_state;

            match outcome {
                Outcome::Done => return Ok(state),
                Outcome::Fail(msg) => {
                    return Err(self.report(current, step_number, StepError::failed(msg)));
                }
                Outcome::Next(target) => {
                    current = target;
                    retries = 0;
                }
                Outcome::Continue => match self.pipeline.default_next(current) {
                    Some(next) => {
                        current = next;
                        retries = 0;
                    }
                    None => {
                        let err = StepError::other(format!(
                            "step '{current}' asked to continue but nothing is wired after it"
                        ));
                        return Err(self.report(current, step_number, err));
                    }
                },
                Outcome::Retry { reason } => {
                    retries += 1;
                    if retries > self.max_retries {
                        let err = StepError::other(format!(
                            "step '{current}' retried past the limit of {}: {reason}",
                            self.max_retries
                        ));
                        return Err(self.report(current, step_number, err));
                    }
                }
                Outcome::Backoff { delay, reason } => {
                    retries += 1;
                    if retries > self.max_retries {
                        let err = StepError::other(format!(
                            "step '{current}' backed off past the limit of {}: {reason}",
                            self.max_retries
                        ));
                        return Err(self.report(current, step_number, err));
                    }
                    std::thread::sleep(delay);
                }
            }
        }
    }
}
