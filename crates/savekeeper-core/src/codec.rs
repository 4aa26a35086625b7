use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: u64,
    pub dirs: u64,
}

/// Packs `source` into a zip at `dest`.
///
/// Entries are rooted at the source directory's own name, so extracting the
/// archive into the parent of `source` recreates it in place. The archive is
/// written to a temporary file next to `dest` and only moved into place once
/// complete, so a failed write never leaves a partial archive at `dest`.
#[instrument(skip_all, fields(source = %source.display(), dest = %dest.display()))]
pub fn compress_dir(source: &Path, dest: &Path) -> Result<ArchiveStats> {
    if !source.is_dir() {
        return Err(Error::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    let base = root_name(source)?;
    let parent = match dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let staging = NamedTempFile::new_in(parent)?;
    trace!(path = %staging.path().display(), "Writing to staging file.");
    let (stats, writer) = write_zip(source, &base, BufWriter::new(staging))?;
    let staging = writer.into_inner().map_err(|e| e.into_error())?;
    staging.as_file().sync_all()?;
    staging.persist(dest).map_err(|e| e.error)?;

    debug!(files = stats.files, dirs = stats.dirs, "Archive written.");
    Ok(stats)
}

fn write_zip<W: Write + Seek>(source: &Path, base: &str, writer: W) -> Result<(ArchiveStats, W)> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut stats = ArchiveStats::default();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let name = entry_name(base, relative);

        if entry.file_type().is_dir() {
            trace!(%name, "Adding directory.");
            zip.add_directory(name, options)?;
            stats.dirs += 1;
        } else if entry.file_type().is_file() {
            trace!(%name, "Adding file.");
            zip.start_file(name, options)?;
            let mut reader = BufReader::new(File::open(entry.path())?);
            io::copy(&mut reader, &mut zip)?;
            stats.files += 1;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular entry.");
        }
    }

    let writer = zip.finish()?;
    Ok((stats, writer))
}

/// Opens and reads the central directory of `archive`.
///
/// Fails on truncated or otherwise unreadable archives without touching
/// anything on disk.
pub fn open_archive(archive: &Path) -> Result<ZipArchive<BufReader<File>>> {
    Ok(ZipArchive::new(BufReader::new(File::open(archive)?))?)
}

/// Unpacks an already opened archive into `dest`, creating it if needed.
pub fn extract_archive<R: Read + Seek>(zip: &mut ZipArchive<R>, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    zip.extract(dest)?;
    debug!(entries = zip.len(), dest = %dest.display(), "Archive extracted.");
    Ok(())
}

/// Unpacks `archive` into `dest`, creating it if needed.
#[instrument(skip_all, fields(archive = %archive.display(), dest = %dest.display()))]
pub fn decompress_archive(archive: &Path, dest: &Path) -> Result<()> {
    let mut zip = open_archive(archive)?;
    extract_archive(&mut zip, dest)
}

fn root_name(source: &Path) -> Result<String> {
    let canonical;
    let named = match source.file_name() {
        Some(name) => name,
        // "." or ".." have no file name of their own.
        None => {
            canonical = source.canonicalize()?;
            canonical.file_name().ok_or_else(|| Error::SourceNotFound {
                path: source.to_path_buf(),
            })?
        }
    };
    Ok(named.to_string_lossy().into_owned())
}

fn entry_name(base: &str, relative: &Path) -> String {
    let mut name = base.to_string();
    for part in relative.components() {
        name.push('/');
        name.push_str(&part.as_os_str().to_string_lossy());
    }
    name
}
