//! The step contract: what a unit of pipeline work looks like and how it can
//! fail.
//!
//! A step takes the state, does one narrow thing to it, and says what should
//! happen next. Deterministic steps (walking, scanning, extracting) mostly
//! answer [`Outcome::Continue`]; the model-calling step is where
//! [`Outcome::Retry`] and [`Outcome::Backoff`] earn their keep, because
//! endpoints rate-limit and replies come back malformed.

use crate::ctx::Ctx;
use std::fmt;
use std::time::Duration;

/// The result of running a step: a new state plus what to do next.
pub type StepResult<S> = Result<(S, Outcome), StepError>;

/// One unit of work in a pipeline.
///
/// Implementors are registered into a [`crate::Pipeline`] under the name
/// returned by [`Step::name`]; that name is also the routing target for
/// [`Outcome::Next`].
pub trait Step<S>: Send + 'static {
    fn name(&self) -> &'static str;

    /// Do the work. Returns the updated state and an [`Outcome`] telling the
    /// runner where to go from here.
    fn run(&mut self, state: S, ctx: &mut Ctx) -> StepResult<S>;
}

/// What a step wants the runner to do next.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Hand off to whatever is wired after this step via `.then()`.
    Continue,
    /// The run is complete; the runner returns the current state.
    Done,
    /// Route to a named step, e.g. back to a fixer after failed validation.
    Next(&'static str),
    /// Re-run this step immediately. Counted against the runner's retry
    /// limit.
    Retry { reason: String },
    /// Sleep, then re-run this step. The polite response to a rate-limited
    /// endpoint. Counted against the retry limit.
    Backoff { delay: Duration, reason: String },
    /// Abort the run; the runner surfaces this as [`StepError::Failed`].
    Fail(String),
}

impl Outcome {
    pub fn retry(reason: impl Into<String>) -> Self {
        Outcome::Retry {
            reason: reason.into(),
        }
    }

    pub fn backoff(delay: Duration, reason: impl Into<String>) -> Self {
        Outcome::Backoff {
            delay,
            reason: reason.into(),
        }
    }
}

/// How a step can fail, sorted by what the caller should do about it.
#[derive(Debug)]
pub enum StepError {
    /// Bad input, a malformed model reply, or a wiring mistake. Retrying
    /// won't help; fix the code or the prompt.
    Invalid(String),
    /// The network or the endpoint hiccuped. Worth retrying.
    Transient(String),
    /// A step gave up on purpose via [`Outcome::Fail`].
    Failed(String),
    /// Everything else; the message has the details.
    Other(String),
}

impl From<ureq::Error> for StepError {
    fn from(e: ureq::Error) -> Self {
        StepError::Transient(e.to_string())
    }
}

impl From<std::io::Error> for StepError {
    fn from(e: std::io::Error) -> Self {
        StepError::Other(e.to_string())
    }
}

impl From<serde_json::Error> for StepError {
    fn from(e: serde_json::Error) -> Self {
        StepError::Invalid(e.to_string())
    }
}

impl StepError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StepError::Invalid(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        StepError::Transient(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        StepError::Failed(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        StepError::Other(msg.into())
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
            Self::Transient(msg) => write!(f, "transient: {msg}"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StepError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_keep_their_messages() {
        assert!(matches!(
            StepError::invalid("purpose missing"),
            StepError::Invalid(msg) if msg == "purpose missing"
        ));
        assert!(matches!(
            StepError::transient("429 from endpoint"),
            StepError::Transient(msg) if msg == "429 from endpoint"
        ));
        assert!(matches!(
            StepError::failed("gave up"),
            StepError::Failed(msg) if msg == "gave up"
        ));
        assert!(matches!(
            StepError::other("disk full"),
            StepError::Other(msg) if msg == "disk full"
        ));
    }

    #[test]
    fn display_prefixes_by_kind() {
        assert_eq!(
            StepError::invalid("no JSON object").to_string(),
            "invalid: no JSON object"
        );
        assert_eq!(
            StepError::transient("timeout").to_string(),
            "transient: timeout"
        );
        assert_eq!(
            StepError::failed("tree unreadable").to_string(),
            "failed: tree unreadable"
        );
        assert_eq!(StepError::other("whatever").to_string(), "whatever");
    }

    #[test]
    fn io_errors_map_to_other() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "source file missing");
        let err: StepError = io.into();
        assert!(matches!(err, StepError::Other(msg) if msg.contains("source file missing")));
    }

    #[test]
    fn json_errors_map_to_invalid() {
        let bad = serde_json::from_str::<serde_json::Value>("```json").unwrap_err();
        let err: StepError = bad.into();
        assert!(matches!(err, StepError::Invalid(_)));
    }

    #[test]
    fn retry_and_backoff_carry_their_reasons() {
        match Outcome::retry("model reply was malformed") {
            Outcome::Retry { reason } => assert_eq!(reason, "model reply was malformed"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match Outcome::backoff(Duration::from_millis(250), "rate limited") {
            Outcome::Backoff { delay, reason } => {
                assert_eq!(delay, Duration::from_millis(250));
                assert_eq!(reason, "rate limited");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
