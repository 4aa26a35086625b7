pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod selector;

// Publicly re-export the main types for a clean external API.
pub use config::Settings;
pub use error::{Error, Result, Step, StepError, StepResult, WithStep};
pub use models::{ArchiveEntry, Operations, Project, ProjectPath, ProjectsFile};

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, span, warn, Level};

/// What happened to a project during a run.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Saved { project_name: String, archive: PathBuf },
    Restored { project_name: String, restore: RestoreOutcome },
    Nothing { project_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    /// The historical archive that was extracted.
    pub archive: PathBuf,
    /// Snapshot of the live directory taken before it was replaced, if it existed.
    pub safety_backup: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ProjectFailure {
    pub project_name: String,
    pub error: StepError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    pub failures: Vec<ProjectFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct Keeper {
    settings: Settings,
}

impl Keeper {
    const SAFETY_BACKUP_SUFFIX: &'static str = "_back.zip";

    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory holding the historical archives of `project_name`.
    pub fn archive_dir(&self, project_name: &str) -> PathBuf {
        self.settings.archive_root.join(project_name)
    }

    /// Runs the requested operations on every project, one after another.
    ///
    /// A failing project never stops its siblings; failures are collected in
    /// the returned report.
    #[instrument(skip_all, name = "run", fields(save = ops.save, restore = ops.restore))]
    pub fn run(&self, projects: &[Project], ops: Operations) -> RunReport {
        info!(project_count = projects.len(), "Starting run...");
        let mut report = RunReport::default();

        for project in projects {
            let project_span = span!(Level::INFO, "project", project_name = %project.name);
            let _enter = project_span.enter();
            info!("Processing project...");

            if let Err(error) = self.run_project(project, ops, &mut report.outcomes) {
                warn!(step = %error.step, error = %error.source, "Project failed.");
                report.failures.push(ProjectFailure {
                    project_name: project.name.clone(),
                    error,
                });
            }
        }

        info!(
            succeeded = report.outcomes.len(),
            failed = report.failures.len(),
            "Run finished."
        );
        report
    }

    fn run_project(
        &self,
        project: &Project,
        ops: Operations,
        outcomes: &mut Vec<Outcome>,
    ) -> StepResult<()> {
        if ops.is_empty() {
            if let Err(e) = project.save_data() {
                warn!(error = %e, "Project has no save data path.");
            }
            info!("No operation requested.");
            outcomes.push(Outcome::Nothing {
                project_name: project.name.clone(),
            });
            return Ok(());
        }

        let save_data = project.save_data().step(Step::ResolveSaveData)?;
        debug!(save_data = %save_data.display(), "Resolved save data path.");
        if ops.save {
            let archive = self.save_project(project)?;
            outcomes.push(Outcome::Saved {
                project_name: project.name.clone(),
                archive,
            });
        }
        if ops.restore {
            let restore = self.restore_project(project)?;
            outcomes.push(Outcome::Restored {
                project_name: project.name.clone(),
                restore,
            });
        }
        Ok(())
    }

    /// Archives the live save data under the current local time.
    pub fn save_project(&self, project: &Project) -> StepResult<PathBuf> {
        self.save_project_at(project, Local::now().naive_local())
    }

    /// Archives the live save data into `<archive_root>/<name>/<timestamp>.zip`.
    #[instrument(skip(self, project), fields(project_name = %project.name))]
    pub fn save_project_at(&self, project: &Project, at: NaiveDateTime) -> StepResult<PathBuf> {
        let save_data = project.save_data().step(Step::ResolveSaveData)?;
        let file_name = selector::archive_file_name(at, &self.settings.timestamp_format);
        let archive_dir = self.archive_dir(&project.name);
        let archive = archive_dir.join(&file_name);

        if !archive_dir.is_dir() {
            debug!(dir = %archive_dir.display(), "Creating archive directory.");
            fs::create_dir_all(&archive_dir).step(Step::PrepareArchiveDir)?;
        }

        info!(from = %save_data.display(), to = %archive.display(), "Saving project...");
        let stats = codec::compress_dir(save_data, &archive).step(Step::Compress)?;
        info!(files = stats.files, "Project saved successfully.");
        Ok(archive)
    }

    /// Replaces the live save data with the most recent historical archive.
    ///
    /// The live directory, when present, is first snapshotted to
    /// `<saveData>_back.zip`. It is only deleted once a replacement archive
    /// has been selected and opened.
    #[instrument(skip(self, project), fields(project_name = %project.name))]
    pub fn restore_project(&self, project: &Project) -> StepResult<RestoreOutcome> {
        let save_data = project.save_data().step(Step::ResolveSaveData)?;
        let live_exists = save_data.exists();

        let safety_backup = if live_exists {
            let backup = Self::safety_backup_path(save_data).step(Step::SafetyBackup)?;
            info!(to = %backup.display(), "Backing up current save data...");
            codec::compress_dir(save_data, &backup).step(Step::SafetyBackup)?;
            Some(backup)
        } else {
            info!("No current save data found, skipping safety backup.");
            None
        };

        let archive_dir = self.archive_dir(&project.name);
        let candidates = self
            .archive_file_names(&archive_dir)
            .step(Step::ListArchives)?;
        debug!(?candidates, "Found archives.");
        let latest = selector::select_latest(
            &candidates,
            &self.settings.timestamp_format,
            &archive_dir,
        )
        .step(Step::SelectArchive)?;
        let archive = archive_dir.join(latest);
        info!(archive = %archive.display(), "Selected latest archive.");
        let mut zip = codec::open_archive(&archive).step(Step::OpenArchive)?;

        if live_exists {
            debug!(path = %save_data.display(), "Removing current save data.");
            fs::remove_dir_all(save_data).step(Step::RemoveLive)?;
        }

        let restore_to = Self::restore_target(save_data);
        info!(to = %restore_to.display(), "Extracting archive...");
        codec::extract_archive(&mut zip, &restore_to).step(Step::Decompress)?;
        info!("Project restored successfully.");

        Ok(RestoreOutcome {
            archive,
            safety_backup,
        })
    }

    /// Lists the historical archives of a project, oldest first.
    pub fn list_archives(&self, project_name: &str) -> Result<Vec<ArchiveEntry>> {
        let archive_dir = self.archive_dir(project_name);
        let format = &self.settings.timestamp_format;
        let mut entries: Vec<ArchiveEntry> = self
            .archive_file_names(&archive_dir)?
            .into_iter()
            .map(|file_name| ArchiveEntry {
                path: archive_dir.join(&file_name),
                created_at: selector::parse_timestamp(&file_name, format),
                file_name,
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.created_at, &a.file_name).cmp(&(b.created_at, &b.file_name))
        });
        Ok(entries)
    }

    /// Names of the `.zip` files directly inside `archive_dir`.
    fn archive_file_names(&self, archive_dir: &Path) -> Result<Vec<String>> {
        if !archive_dir.is_dir() {
            return Err(Error::ArchiveDirNotFound {
                dir: archive_dir.to_path_buf(),
            });
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(archive_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_zip = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(selector::ARCHIVE_EXTENSION));
            if !entry.file_type()?.is_file() || !is_zip {
                debug!(path = %path.display(), "Skipping non-archive entry.");
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(?name, "Skipping archive with non UTF-8 name."),
            }
        }
        names.sort();
        Ok(names)
    }

    fn safety_backup_path(save_data: &Path) -> Result<PathBuf> {
        let name = save_data
            .file_name()
            .ok_or_else(|| Error::SourceNotFound {
                path: save_data.to_path_buf(),
            })?;
        let mut backup_name = name.to_os_string();
        backup_name.push(Self::SAFETY_BACKUP_SUFFIX);
        Ok(save_data.with_file_name(backup_name))
    }

    fn restore_target(save_data: &Path) -> PathBuf {
        match save_data.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
