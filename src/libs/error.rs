use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Broad failure classes, for callers that need to branch on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    ExternalStage,
    Parse,
    Io,
}

/// How an external process ended when it did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Code(i32),
    /// Killed by a signal; no exit code available
    Signal,
}

impl From<ExitStatus> for ExitReason {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitReason::Code(code),
            None => ExitReason::Signal,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Code(code) => write!(f, "exit status {}", code),
            ExitReason::Signal => write!(f, "terminated by signal"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input, directory, tool or option value is missing or unusable
    #[error("{0}")]
    Precondition(String),

    #[error("stage [{stage}] failed with {reason}: {command}")]
    StageFailed {
        stage: String,
        command: String,
        reason: ExitReason,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Precondition(_) => ErrorKind::Precondition,
            PipelineError::StageFailed { .. } => ErrorKind::ExternalStage,
            PipelineError::Parse { .. } => ErrorKind::Parse,
            PipelineError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse<P: Into<PathBuf>>(path: P, line: usize, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_messages() {
        let e = PipelineError::Precondition("missing working directory: x".to_string());
        assert_eq!(e.kind(), ErrorKind::Precondition);
        assert_eq!(e.to_string(), "missing working directory: x");

        let e = PipelineError::StageFailed {
            stage: "train".to_string(),
            command: "trainer a b".to_string(),
            reason: ExitReason::Code(2),
        };
        assert_eq!(e.kind(), ErrorKind::ExternalStage);
        assert_eq!(
            e.to_string(),
            "stage [train] failed with exit status 2: trainer a b"
        );

        let e = PipelineError::parse("s.scores", 3, "bad length");
        assert_eq!(e.kind(), ErrorKind::Parse);
        assert_eq!(e.to_string(), "s.scores:3: bad length");
    }
}
