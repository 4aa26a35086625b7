//! Picks the newest archive out of a project's archive directory.
//!
//! Archive names are `<timestamp>.zip`. Among several candidates the one with
//! the latest timestamp wins; names whose timestamp can't be read rank below
//! every readable one, and equal timestamps fall back to the larger file name.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::path::Path;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// Formats the archive file name for `at`.
pub fn archive_file_name(at: NaiveDateTime, format: &str) -> String {
    format!("{}.{}", at.format(format), ARCHIVE_EXTENSION)
}

/// Reads the timestamp back out of an archive file name.
pub fn parse_timestamp(file_name: &str, format: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    NaiveDateTime::parse_from_str(stem, format).ok()
}

/// Returns the most recent of `candidates`.
///
/// `archive_dir` is only used to describe the error when there is nothing to
/// pick from.
pub fn select_latest<'a, S: AsRef<str>>(
    candidates: &'a [S],
    format: &str,
    archive_dir: &Path,
) -> Result<&'a str> {
    match candidates {
        [] => Err(Error::NoBackupAvailable {
            dir: archive_dir.to_path_buf(),
        }),
        [only] => Ok(only.as_ref()),
        many => Ok(many
            .iter()
            .map(|name| {
                let name = name.as_ref();
                (parse_timestamp(name, format), name)
            })
            .max()
            .map(|(_, name)| name)
            .unwrap_or_default()),
    }
}
