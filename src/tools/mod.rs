//! Small, constrained functions a pipeline (or a model) is allowed to call.
//!
//! A tool should do one narrow thing and refuse everything else; the
//! [`shell::ShellTool`] allowlist is the template.

pub mod fs;
pub mod parse;
pub mod shell;

pub use fs::{read_file, write_file};
pub use parse::{extract_json, strip_code_fences};
pub use shell::{CmdOutput, ShellTool};
