//! Build LLM automation as decomposed pipelines.
//!
//! The working principle: break the job into deterministic steps first, and
//! hand the model the smallest possible piece. A typical pipeline walks files,
//! scans and extracts candidates with plain code, makes one model call per
//! item, and validates the response into a fixed-shape record.
//!
//! Steps communicate through shared context ([`Ctx`]) and control flow with
//! outcomes like [`Outcome::Continue`], [`Outcome::Next`], [`Outcome::Retry`],
//! and [`Outcome::Done`]. The [`summarize`] module is the whole idea wired
//! end to end.
//!
//! # Quick start
//!
//! ```rust
//! use codeline::{Ctx, Outcome, Pipeline, Runner, Step, StepResult};
//!
//! #[derive(Clone)]
//! struct State { n: i32 }
//!
//! struct AddOne;
//! impl Step<State> for AddOne {
//!     fn name(&self) -> &'static str { "add_one" }
//!     fn run(&mut self, state: State, _ctx: &mut Ctx) -> StepResult<State> {
//!         Ok((State { n: state.n + 1 }, Outcome::Done))
//!     }
//! }
//!
//! let mut ctx = Ctx::new();
//! let pipeline = Pipeline::builder("demo")
//!     .register(AddOne)
//!     .build()
//!     .unwrap();
//!
//! let result = Runner::new(pipeline).run(State { n: 0 }, &mut ctx).unwrap();
//! assert_eq!(result.n, 1);
//! ```

mod ctx;
mod pipeline;
mod runner;
mod step;

pub mod discover;
pub mod extract;
pub mod llm;
pub mod scan;
pub mod summarize;
pub mod tools;

pub use ctx::Ctx;
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use runner::{ErrorEvent, Runner, StepEvent};
pub use step::{Outcome, Step, StepError, StepResult};
