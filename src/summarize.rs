//! The reference pipeline: summarize the functions of a codebase.
//!
//! Everything up to the model call is deterministic — walk the tree, pick the
//! files, regex out the candidate units — and the model is asked for exactly
//! one small thing per call: describe one function. A failed or malformed
//! model response costs one placeholder record, never the run.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::discover::{SourceFile, discover_sources};
use crate::extract::{CodeUnit, Extractor};
use crate::pipeline::{Pipeline, PipelineError};
use crate::scan::scan_lines;
use crate::step::{Outcome, Step, StepError, StepResult};
use crate::tools::fs::{read_file, write_file};
use crate::Ctx;

/// Purpose recorded when the model call fails or its output is rejected.
pub const PLACEHOLDER_PURPOSE: &str = "(summary unavailable)";

/// The fixed-shape record the model must produce, one per code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// `path:line` of the summarized unit.
    pub location: String,
    /// One-sentence description; must start with the configured prefix.
    pub purpose: String,
}

impl UnitSummary {
    /// Enforce the fixed leading word on the purpose field.
    pub fn check(&self, required_prefix: &str) -> Result<(), StepError> {
        if self.purpose.starts_with(required_prefix) {
            Ok(())
        } else {
            Err(StepError::invalid(format!(
                "purpose must start with '{required_prefix}': {:?}",
                self.purpose
            )))
        }
    }
}

/// Knobs for a summarize run.
#[derive(Debug, Clone)]
pub struct SummarizeOpts {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    /// When set, only files containing this substring are summarized.
    pub keyword: Option<String>,
    /// The fixed word every purpose description must start with.
    pub required_prefix: String,
    /// When set, the final digest is also written to this file.
    pub report_path: Option<PathBuf>,
}

impl SummarizeOpts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ["rs", "py", "js", "ts", "go"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keyword: None,
            required_prefix: "Provides".to_string(),
            report_path: None,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.required_prefix = prefix.into();
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }
}

/// State threaded through the summarize pipeline.
#[derive(Debug, Clone)]
pub struct SummarizeJob {
    pub opts: SummarizeOpts,
    pub files: Vec<SourceFile>,
    pub units: Vec<CodeUnit>,
    pub summaries: Vec<UnitSummary>,
    pub report: String,
}

impl SummarizeJob {
    pub fn new(opts: SummarizeOpts) -> Self {
        Self {
            opts,
            files: Vec::new(),
            units: Vec::new(),
            summaries: Vec::new(),
            report: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Walk the tree, pick candidate files, and apply the keyword scan if one is
/// configured. Deterministic.
pub struct Discover;
impl Step<SummarizeJob> for Discover {
    fn name(&self) -> &'static str {
        "discover"
    }
    fn run(&mut self, mut state: SummarizeJob, ctx: &mut Ctx) -> StepResult<SummarizeJob> {
        let exts: Vec<&str> = state.opts.extensions.iter().map(|s| s.as_str()).collect();
        state.files = discover_sources(&state.opts.root, &exts);

        if let Some(keyword) = &state.opts.keyword {
            let mut kept = Vec::new();
            for file in state.files.drain(..) {
                if !scan_lines(&file.path, keyword)?.is_empty() {
                    kept.push(file);
                }
            }
            state.files = kept;
        }

        ctx.log(format!("discover: {} candidate files", state.files.len()));
        Ok((state, Outcome::Continue))
    }
}

/// Regex out candidate function signatures. Deterministic.
pub struct Extract;
impl Step<SummarizeJob> for Extract {
    fn name(&self) -> &'static str {
        "extract"
    }
    fn run(&mut self, mut state: SummarizeJob, ctx: &mut Ctx) -> StepResult<SummarizeJob> {
        let extractor = Extractor::new()?;
        for file in &state.files {
            let content = read_file(&file.path)?;
            state.units.extend(extractor.units_in(file, &content));
        }
        ctx.log(format!("extract: {} code units", state.units.len()));
        Ok((state, Outcome::Continue))
    }
}

/// The single non-deterministic step: one model call per code unit.
pub struct Summarize;
impl Step<SummarizeJob> for Summarize {
    fn name(&self) -> &'static str {
        "summarize"
    }
    fn run(&mut self, mut state: SummarizeJob, ctx: &mut Ctx) -> StepResult<SummarizeJob> {
        let prefix = state.opts.required_prefix.clone();
        let mut placeholders = 0usize;

        for unit in &state.units {
            let sent = ctx
                .llm()
                .system(system_prompt(&prefix))
                .user(unit_prompt(unit))
                .send_structured::<UnitSummary>();

            let summary = match sent {
                Ok(mut summary) => {
                    // the extractor's location is authoritative; models mangle paths
                    summary.location = unit.location.clone();
                    if let Err(err) = summary.check(&prefix) {
                        warn!("rejected summary for {}: {err}", unit.location);
                        summary.purpose = PLACEHOLDER_PURPOSE.to_string();
                        placeholders += 1;
                    }
                    summary
                }
                Err(err) => {
                    warn!("model call failed for {}: {err}", unit.location);
                    placeholders += 1;
                    UnitSummary {
                        location: unit.location.clone(),
                        purpose: PLACEHOLDER_PURPOSE.to_string(),
                    }
                }
            };
            state.summaries.push(summary);
        }

        ctx.log(format!(
            "summarize: {} records ({placeholders} placeholders)",
            state.summaries.len()
        ));
        Ok((state, Outcome::Continue))
    }
}

/// Render the collected records as a plain-text digest. Deterministic.
pub struct Report;
impl Step<SummarizeJob> for Report {
    fn name(&self) -> &'static str {
        "report"
    }
    fn run(&mut self, mut state: SummarizeJob, ctx: &mut Ctx) -> StepResult<SummarizeJob> {
        let mut out = format!("{} units summarized\n\n", state.summaries.len());
        for summary in &state.summaries {
            out.push_str(&format!("- {}: {}\n", summary.location, summary.purpose));
        }
        state.report = out;

        if let Some(path) = &state.opts.report_path {
            write_file(path, &state.report)?;
            ctx.log(format!("report: wrote {}", path.display()));
        }
        Ok((state, Outcome::Done))
    }
}

fn system_prompt(prefix: &str) -> String {
    format!(
        "You describe one function at a time. Reply with a single JSON object \
         with string fields \"location\" and \"purpose\". The purpose is one \
         sentence and must start with the word \"{prefix}\". No markdown, no \
         extra text."
    )
}

fn unit_prompt(unit: &CodeUnit) -> String {
    format!(
        "Location: {}\nSignature: {}\n\n{}",
        unit.location, unit.signature, unit.snippet
    )
}

/// Wire the four steps into a ready-to-run pipeline.
pub fn summarize_pipeline() -> Result<Pipeline<SummarizeJob>, PipelineError> {
    Pipeline::builder("summarize")
        .register(Discover)
        .register(Extract)
        .register(Summarize)
        .register(Report)
        .start_at("discover")
        .then("extract")
        .then("summarize")
        .then("report")
        .build()
}
