//! Deterministic signature extraction: regex-based harvesting of candidate
//! function and method signatures, one [`CodeUnit`] per hit.
//!
//! Regexes over source text are knowingly approximate; the goal is candidate
//! units for a model to describe, not a parser. Comment lines and strings can
//! produce false positives, which downstream validation tolerates.

use regex::Regex;
use std::path::Path;

use crate::discover::SourceFile;
use crate::step::StepError;

/// Lines of context captured after a signature line.
pub const SNIPPET_LINES: usize = 12;

/// One extracted function or method, ready to be summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    /// `path:line` of the signature.
    pub location: String,
    /// The function or method name.
    pub name: String,
    /// The signature line, trimmed.
    pub signature: String,
    /// Up to [`SNIPPET_LINES`] lines following the signature.
    pub snippet: String,
}

struct Rule {
    exts: &'static [&'static str],
    re: Regex,
}

/// Compiled per-language signature rules.
pub struct Extractor {
    rules: Vec<Rule>,
}

impl Extractor {
    pub fn new() -> Result<Self, StepError> {
        let table: &[(&[&str], &str)] = &[
            (
                &["rs"],
                r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)"#,
            ),
            (&["py"], r"^\s*(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\("),
            (
                &["js", "jsx", "ts", "tsx"],
                r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\(",
            ),
            (
                &["go"],
                r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*\(",
            ),
        ];

        let mut rules = Vec::with_capacity(table.len());
        for (exts, pattern) in table {
            let re = Regex::new(pattern)
                .map_err(|e| StepError::invalid(format!("bad signature pattern: {e}")))?;
            rules.push(Rule { exts, re });
        }
        Ok(Self { rules })
    }

    fn rule_for(&self, ext: &str) -> Option<&Regex> {
        self.rules
            .iter()
            .find(|r| r.exts.contains(&ext))
            .map(|r| &r.re)
    }

    /// Whether any rule covers files with this extension.
    pub fn supports(&self, ext: &str) -> bool {
        self.rule_for(ext).is_some()
    }

    /// Extract candidate units from one file's content, top to bottom.
    pub fn units_in(&self, file: &SourceFile, content: &str) -> Vec<CodeUnit> {
        let Some(re) = self.rule_for(&file.ext) else {
            return Vec::new();
        };

        let lines: Vec<&str> = content.lines().collect();
        let mut units = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = re.captures(line) else {
                continue;
            };
            let Some(name) = caps.get(1) else { continue };

            let end = (i + 1 + SNIPPET_LINES).min(lines.len());
            units.push(CodeUnit {
                location: location(&file.path, i + 1),
                name: name.as_str().to_string(),
                signature: line.trim().to_string(),
                snippet: lines[i + 1..end].join("\n"),
            });
        }

        units
    }
}

fn location(path: &Path, line_no: usize) -> String {
    format!("{}:{}", path.display(), line_no)
}
