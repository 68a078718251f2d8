use std::path::PathBuf;
use std::process::Command;

use crate::step::StepError;

/// Output from a tool-invoked command.
pub struct CmdOutput {
    /// Whether the command exited with status 0.
    pub success: bool,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

// Rejected in program names and arguments. Commands are exec'd directly, not
// run through a shell, so these have no legitimate use here.
const SHELL_META: &[char] = &[';', '|', '&', '$', '`', '<', '>', '\n', '\r'];

/// A shell wrapper constrained to an allowlist of programs.
///
/// There is no `sh -c` pass-through: the program is exec'd directly with its
/// arguments, programs outside the allowlist are rejected, and shell
/// metacharacters anywhere in the invocation are rejected.
pub struct ShellTool {
    allow: Vec<String>,
    workdir: Option<PathBuf>,
}

impl ShellTool {
    /// Create a tool that may only run the named programs.
    pub fn new<I, S>(allow: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: allow.into_iter().map(Into::into).collect(),
            workdir: None,
        }
    }

    /// Run commands from this directory instead of the process cwd.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Run one allowlisted program with the given arguments.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput, StepError> {
        if !self.allow.iter().any(|p| p == program) {
            return Err(StepError::invalid(format!(
                "program not in allowlist: {program}"
            )));
        }
        for piece in std::iter::once(program).chain(args.iter().copied()) {
            if piece.contains(SHELL_META) {
                return Err(StepError::invalid(format!(
                    "shell metacharacter in argument: {piece:?}"
                )));
            }
        }

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;

        Ok(CmdOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_allowlisted_program() {
        let tool = ShellTool::new(["echo"]);
        let output = tool.run("echo", &["hello"]).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn rejects_program_outside_allowlist() {
        let tool = ShellTool::new(["echo"]);
        let err = tool.run("rm", &["-rf", "/"]).err().unwrap();
        assert!(matches!(err, StepError::Invalid(msg) if msg.contains("allowlist")));
    }

    #[test]
    fn rejects_shell_metacharacters() {
        let tool = ShellTool::new(["echo"]);
        let err = tool.run("echo", &["hi; rm -rf /"]).err().unwrap();
        assert!(matches!(err, StepError::Invalid(msg) if msg.contains("metacharacter")));
    }

    #[test]
    fn no_shell_interpretation_of_plain_args() {
        // A glob reaches the program as literal text, proof there is no shell
        let tool = ShellTool::new(["echo"]);
        let output = tool.run("echo", &["*"]).unwrap();
        assert_eq!(output.stdout.trim(), "*");
    }

    #[test]
    fn in_dir_sets_working_directory() {
        let tool = ShellTool::new(["pwd"]).in_dir("/tmp");
        let output = tool.run("pwd", &[]).unwrap();
        assert!(output.success);
        // On macOS /tmp symlinks to /private/tmp
        let pwd = output.stdout.trim();
        assert!(pwd == "/tmp" || pwd == "/private/tmp");
    }

    #[test]
    fn nonexistent_workdir_is_an_error() {
        let tool = ShellTool::new(["ls"]).in_dir("/nonexistent_dir_xyz_abc");
        assert!(tool.run("ls", &[]).is_err());
    }

    #[test]
    fn captures_stderr_and_failure_status() {
        let tool = ShellTool::new(["ls"]);
        let output = tool.run("ls", &["/nonexistent_dir_xyz_abc"]).unwrap();
        assert!(!output.success);
        assert!(!output.stderr.is_empty());
    }
}
