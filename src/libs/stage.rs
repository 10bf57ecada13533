//! Checkpointed execution of pipeline stages.
//!
//! A stage is "done" when its sentinel `<output>.ok` exists. The sentinel is
//! only written after the stage's action returned `Ok`, so a crash or a failed
//! external tool leaves the stage pending for the next run.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::info;

use crate::libs::error::{PipelineError, Result};
use crate::libs::tool::{Tool, ToolResolver};

/// Zero-byte completion marker for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    /// Sentinel for the stage producing `output`, at `<output>.ok`.
    pub fn for_output<P: AsRef<Path>>(output: P) -> Self {
        let mut path = output.as_ref().as_os_str().to_os_string();
        path.push(".ok");
        Self {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_done(&self) -> bool {
        self.path.exists()
    }

    pub fn mark_done(&self) -> Result<()> {
        File::create(&self.path).map_err(|e| PipelineError::io(&self.path, e))?;
        Ok(())
    }
}

/// An external program invocation as an explicit argument vector.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
    stdout: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            stdout: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Captures the program's standard output into `path`.
    pub fn stdout_to<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Command line for messages; not meant to be fed to a shell.
    pub fn render(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if let Some(out) = &self.stdout {
            line.push_str(&format!(" > {}", out.display()));
        }
        line
    }

    /// Runs the program and waits for it. Captured output goes to a temporary
    /// file next to the destination and is renamed into place on success only.
    pub fn run(&self, stage: &str) -> Result<()> {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());

        let captured = match &self.stdout {
            Some(dest) => {
                let dir = match dest.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                let tmp = tempfile::NamedTempFile::new_in(&dir)
                    .map_err(|e| PipelineError::io(&dir, e))?;
                let handle = tmp
                    .as_file()
                    .try_clone()
                    .map_err(|e| PipelineError::io(tmp.path(), e))?;
                cmd.stdout(Stdio::from(handle));
                Some((tmp, dest))
            }
            None => None,
        };

        let status = cmd.status().map_err(|e| PipelineError::io(&self.program, e))?;
        if !status.success() {
            return Err(PipelineError::StageFailed {
                stage: stage.to_string(),
                command: self.render(),
                reason: status.into(),
            });
        }

        if let Some((tmp, dest)) = captured {
            tmp.persist(dest)
                .map_err(|e| PipelineError::io(dest, e.error))?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Ran,
    Skipped,
}

/// Runs stages in order and remembers what each one did.
#[derive(Debug)]
pub struct StageRunner {
    resolver: ToolResolver,
    history: Vec<(String, StageOutcome)>,
}

impl StageRunner {
    pub fn new(resolver: ToolResolver) -> Self {
        Self {
            resolver,
            history: vec![],
        }
    }

    /// A fresh invocation of `tool`, resolved to its executable.
    pub fn command(&self, tool: Tool) -> Result<ExternalCommand> {
        Ok(ExternalCommand::new(self.resolver.resolve(tool)?))
    }

    /// Skips `name` when `checkpoint` exists; otherwise runs `action` and marks
    /// the checkpoint once it succeeds.
    pub fn run_stage<F>(&mut self, name: &str, checkpoint: &Checkpoint, action: F) -> Result<StageOutcome>
    where
        F: FnOnce() -> Result<()>,
    {
        if checkpoint.is_done() {
            info!("    skip [{}], found {}", name, checkpoint.path().display());
            self.history.push((name.to_string(), StageOutcome::Skipped));
            return Ok(StageOutcome::Skipped);
        }

        info!("==> {}", name);
        action()?;
        checkpoint.mark_done()?;
        self.history.push((name.to_string(), StageOutcome::Ran));

        Ok(StageOutcome::Ran)
    }

    /// Runs a step that is cheap enough to repeat on every invocation.
    pub fn run_step<T, F>(&mut self, name: &str, action: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        info!("==> {}", name);
        let value = action()?;
        self.history.push((name.to_string(), StageOutcome::Ran));

        Ok(value)
    }

    pub fn history(&self) -> &[(String, StageOutcome)] {
        &self.history
    }

    /// Names of the stages that actually executed.
    pub fn executed(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter(|(_, outcome)| *outcome == StageOutcome::Ran)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
