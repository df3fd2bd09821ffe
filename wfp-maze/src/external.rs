use crate::loader::load_bitmap;
use log::{debug, info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use wfp_core::{GenerationError, MazeAlgorithm, MazeSource, RawMaze};

/// File name the reference generator script writes.
pub const DEFAULT_ARTIFACT: &str = "maze.bin";

/// How to invoke an out-of-process generator.
///
/// `{size}` and `{algorithm}` in `args` are replaced on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Where the process leaves the bitmap. Relative paths resolve against `working_dir`.
    pub artifact: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl Default for ExternalCommand {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec![
                "scripts/gen_maze.py".to_string(),
                "{size}".to_string(),
                "{algorithm}".to_string(),
            ],
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            working_dir: None,
        }
    }
}

impl ExternalCommand {
    /// Arguments with the placeholders filled in.
    pub fn expand_args(&self, size: usize, algorithm: MazeAlgorithm) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{size}", &size.to_string())
                    .replace("{algorithm}", algorithm.as_str())
            })
            .collect()
    }

    /// The artifact location after resolving it against the working directory.
    pub fn artifact_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.artifact.is_relative() => dir.join(&self.artifact),
            _ => self.artifact.clone(),
        }
    }
}

/// Runs a generator process and reads back its flat bitmap artifact.
#[derive(Debug, Clone, Default)]
pub struct ExternalGenerator {
    command: ExternalCommand,
}

impl ExternalGenerator {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }

    pub const fn command(&self) -> &ExternalCommand {
        &self.command
    }
}

fn remove_stale(path: &Path) -> Result<(), GenerationError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale artifact {:?}", path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl MazeSource for ExternalGenerator {
    fn generate(
        &mut self,
        size: usize,
        algorithm: MazeAlgorithm,
    ) -> Result<RawMaze, GenerationError> {
        let artifact = self.command.artifact_path();
        remove_stale(&artifact)?;

        let args = self.command.expand_args(size, algorithm);
        info!("Running generator: {} {}", self.command.program, args.join(" "));
        let mut process = Command::new(&self.command.program);
        process.args(&args);
        if let Some(dir) = &self.command.working_dir {
            process.current_dir(dir);
        }
        let output = process.output().map_err(|source| GenerationError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                warn!("Generator stderr: {}", stderr.trim());
            }
            return Err(GenerationError::ProcessFailed {
                status: output.status.to_string(),
            });
        }
        load_bitmap(&artifact, Some(size))
    }
}
