use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level shape of `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsFile {
    pub projects: Vec<Project>,
}

impl ProjectsFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: ProjectPath,
}

impl Project {
    /// The live save-data directory, or an error if none is configured.
    pub fn save_data(&self) -> Result<&Path> {
        match self.path.save_data.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => Ok(p),
            _ => Err(Error::MissingSaveDataPath {
                project: self.name.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPath {
    /// The live directory being protected.
    #[serde(default)]
    pub save_data: Option<PathBuf>,
    /// Accepted but not used by any operation yet.
    #[serde(default)]
    pub back: Option<PathBuf>,
    /// Accepted but not used by any operation yet.
    #[serde(default)]
    pub restore: Option<PathBuf>,
}

/// A historical archive found in a project's archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operations {
    pub save: bool,
    pub restore: bool,
}

impl Operations {
    pub fn is_empty(&self) -> bool {
        !self.save && !self.restore
    }
}
