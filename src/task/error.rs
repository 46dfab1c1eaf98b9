use super::TaskKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a task invocation or of one of its inputs.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid source glob: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The file was rejected by a parser or transformation step.
    #[error("{}: {message}", path.display())]
    Source { path: PathBuf, message: String },

    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external collaborator failed (missing, non-zero exit, bad include).
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("missing generated stylesheet `{}` (produced by the {producer} task)", path.display())]
    MissingGenerated { path: PathBuf, producer: TaskKind },
}

impl TaskError {
    pub fn invalid(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Source {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// Write failures abort the invocation instead of being collected.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Pattern(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_generated_message() {
        let err = TaskError::MissingGenerated {
            path: PathBuf::from("css/sprite.scss"),
            producer: TaskKind::Sprite,
        };
        assert_eq!(
            err.to_string(),
            "missing generated stylesheet `css/sprite.scss` (produced by the sprite task)"
        );
    }

    #[test]
    fn test_fatal_only_for_writes_and_globs() {
        let write = TaskError::Write {
            path: PathBuf::from("out/a.css"),
            source: io::Error::other("disk full"),
        };
        assert!(write.is_fatal());
        assert!(!TaskError::invalid("a.scss", "expected ;").is_fatal());
        assert!(!TaskError::tool("sass", "not found").is_fatal());
    }
}
