use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Could not parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project '{project}' has no saveData path configured")]
    MissingSaveDataPath { project: String },

    #[error("No backup available in '{}'", dir.display())]
    NoBackupAvailable { dir: PathBuf },

    #[error("Archive directory '{}' does not exist", dir.display())]
    ArchiveDirNotFound { dir: PathBuf },

    #[error("Source directory '{}' does not exist", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Invalid timestamp format '{0}'")]
    InvalidTimestampFormat(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to walk directory: {0}")]
    WalkDir(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The step of a save or restore at which something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ResolveSaveData,
    PrepareArchiveDir,
    Compress,
    SafetyBackup,
    ListArchives,
    SelectArchive,
    OpenArchive,
    RemoveLive,
    Decompress,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ResolveSaveData => "resolving saveData path",
            Step::PrepareArchiveDir => "preparing archive directory",
            Step::Compress => "compressing save data",
            Step::SafetyBackup => "creating safety backup",
            Step::ListArchives => "listing archives",
            Step::SelectArchive => "selecting latest archive",
            Step::OpenArchive => "opening archive",
            Step::RemoveLive => "removing live save data",
            Step::Decompress => "extracting archive",
        };
        f.write_str(name)
    }
}

/// An [`Error`] tagged with the [`Step`] it happened in.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct StepError {
    pub step: Step,
    #[source]
    pub source: Error,
}

pub type StepResult<T> = std::result::Result<T, StepError>;

/// Attaches a [`Step`] to a fallible result.
pub trait WithStep<T> {
    fn step(self, step: Step) -> StepResult<T>;
}

impl<T, E: Into<Error>> WithStep<T> for std::result::Result<T, E> {
    fn step(self, step: Step) -> StepResult<T> {
        self.map_err(|e| StepError {
            step,
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_attached_to_io_errors() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let err = result.step(Step::RemoveLive).unwrap_err();
        assert_eq!(err.step, Step::RemoveLive);
        assert!(matches!(err.source, Error::Io(_)));
        assert_eq!(
            err.to_string(),
            "removing live save data failed: I/O error: denied"
        );
    }

    #[test]
    fn ok_results_pass_through() {
        let result: Result<u8> = Ok(7);
        assert_eq!(result.step(Step::Compress).unwrap(), 7);
    }
}
