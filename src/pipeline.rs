//! Wiring steps into a validated graph.
//!
//! A pipeline is a set of named steps plus the default hand-off order between
//! them. All wiring mistakes (a name registered twice, a `.then()` pointing
//! nowhere, no start step) are caught by [`PipelineBuilder::build`], so a
//! [`Pipeline`] that exists is a pipeline that can run.

use crate::Step;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    /// Two steps were registered under the same name.
    DuplicateStep(&'static str),
    /// `start_at` or `then` referenced a step nobody registered.
    UnknownStep(&'static str),
    /// The builder had no steps at all.
    MissingStart,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateStep(name) => write!(f, "step '{name}' registered twice"),
            Self::UnknownStep(name) => write!(f, "no step named '{name}' registered"),
            Self::MissingStart => write!(f, "pipeline has no start step"),
        }
    }
}

impl std::error::Error for PipelineError {}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct PipelineBuilder<S: Clone + 'static> {
    name: &'static str,
    start: Option<&'static str>,
    chain_last: Option<&'static str>,
    // registration order preserved so build() can report the first duplicate
    registered: Vec<(&'static str, Box<dyn Step<S>>)>,
    edges: Vec<(&'static str, &'static str)>,
}

impl<S: Clone + 'static> PipelineBuilder<S> {
    /// Add a step under the name it reports. The first registered step is the
    /// start unless [`start_at`](Self::start_at) says otherwise.
    pub fn register<T: Step<S>>(mut self, step: T) -> Self {
        let name = step.name();
        self.registered.push((name, Box::new(step)));
        if self.start.is_none() {
            self.start = Some(name);
            self.chain_last = Some(name);
        }
        self
    }

    pub fn start_at(mut self, step: &'static str) -> Self {
        self.start = Some(step);
        self.chain_last = Some(step);
        self
    }

    /// Wire the default hand-off: the most recently chained step flows into
    /// `next` when it answers `Outcome::Continue`.
    pub fn then(mut self, next: &'static str) -> Self {
        match self.chain_last {
            Some(current) => self.edges.push((current, next)),
            // nothing chained yet; treat `next` as the start
            None => self.start = Some(next),
        }
        self.chain_last = Some(next);
        self
    }

    pub fn build(self) -> Result<Pipeline<S>, PipelineError> {
        let start = self.start.ok_or(PipelineError::MissingStart)?;

        let mut steps = HashMap::with_capacity(self.registered.len());
        for (name, step) in self.registered {
            if steps.insert(name, step).is_some() {
                return Err(PipelineError::DuplicateStep(name));
            }
        }

        if !steps.contains_key(start) {
            return Err(PipelineError::UnknownStep(start));
        }

        let mut default_next = HashMap::with_capacity(self.edges.len());
        for (from, to) in self.edges {
            if !steps.contains_key(to) {
                return Err(PipelineError::UnknownStep(to));
            }
            default_next.insert(from, to);
        }

        Ok(Pipeline {
            name: self.name,
            start,
            steps,
            default_next,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A validated step graph. Only [`PipelineBuilder::build`] makes one.
pub struct Pipeline<S: Clone + 'static> {
    name: &'static str,
    start: &'static str,
    steps: HashMap<&'static str, Box<dyn Step<S>>>,
    default_next: HashMap<&'static str, &'static str>,
}

impl<S: Clone + 'static> Pipeline<S> {
    pub fn builder(name: &'static str) -> PipelineBuilder<S> {
        PipelineBuilder {
            name,
            start: None,
            chain_last: None,
            registered: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn start(&self) -> &'static str {
        self.start
    }

    pub(crate) fn step_mut(&mut self, name: &'static str) -> Option<&mut Box<dyn Step<S>>> {
        self.steps.get_mut(name)
    }

    pub(crate) fn default_next(&self, from: &'static str) -> Option<&'static str> {
        self.default_next.get(from).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ctx, Outcome, StepResult};

    // a stand-in for the discover/extract/summarize/report kind of flow
    #[derive(Clone, Default)]
    struct Digest {
        trace: Vec<&'static str>,
    }

    struct Stage(&'static str);

    impl Step<Digest> for Stage {
        fn name(&self) -> &'static str {
            self.0
        }
        fn run(&mut self, mut state: Digest, _ctx: &mut Ctx) -> StepResult<Digest> {
            state.trace.push(self.0);
            Ok((state, Outcome::Done))
        }
    }

    #[test]
    fn chained_flow_builds_with_its_wiring() {
        let p = Pipeline::builder("digest")
            .register(Stage("gather"))
            .register(Stage("describe"))
            .register(Stage("render"))
            .start_at("gather")
            .then("describe")
            .then("render")
            .build()
            .unwrap();

        assert_eq!(p.name(), "digest");
        assert_eq!(p.start(), "gather");
        assert_eq!(p.default_next("gather"), Some("describe"));
        assert_eq!(p.default_next("describe"), Some("render"));
        assert_eq!(p.default_next("render"), None);
    }

    #[test]
    fn first_registered_step_is_the_default_start() {
        let p = Pipeline::builder("digest")
            .register(Stage("gather"))
            .register(Stage("render"))
            .build()
            .unwrap();

        assert_eq!(p.start(), "gather");
    }

    #[test]
    fn empty_builder_has_no_start() {
        let err = Pipeline::<Digest>::builder("digest").build().err().unwrap();
        assert!(matches!(err, PipelineError::MissingStart));
        assert_eq!(err.to_string(), "pipeline has no start step");
    }

    #[test]
    fn registering_a_name_twice_is_rejected() {
        let err = Pipeline::builder("digest")
            .register(Stage("gather"))
            .register(Stage("gather"))
            .build()
            .err()
            .unwrap();

        assert!(matches!(err, PipelineError::DuplicateStep("gather")));
    }

    #[test]
    fn start_at_must_name_a_registered_step() {
        let err = Pipeline::builder("digest")
            .register(Stage("gather"))
            .start_at("describe")
            .build()
            .err()
            .unwrap();

        assert!(matches!(err, PipelineError::UnknownStep("describe")));
    }

    #[test]
    fn then_must_name_a_registered_step() {
        let err = Pipeline::builder("digest")
            .register(Stage("gather"))
            .then("describe")
            .build()
            .err()
            .unwrap();

        assert!(matches!(err, PipelineError::UnknownStep("describe")));
    }
}
