use crate::error::{Error, Result};
use crate::selector;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_ARCHIVE_ROOT: &str = "saveData";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
pub const ENV_PREFIX: &str = "SAVEKEEPER";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one archive folder per project.
    pub archive_root: PathBuf,

    /// strftime format used to name archives and to read their timestamps back.
    pub timestamp_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from(DEFAULT_ARCHIVE_ROOT),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults overridden by `SAVEKEEPER_*` environment variables.
    pub fn new() -> Result<Self> {
        Self::builder()?
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(Error::Settings)
            .and_then(Self::from_config)
    }

    /// A builder pre-seeded with the default values.
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("archive_root", DEFAULT_ARCHIVE_ROOT)?
            .set_default("timestamp_format", DEFAULT_TIMESTAMP_FORMAT)?)
    }

    pub fn from_config(config: config::Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that the timestamp format names archives inside the project
    /// directory and that those names can be read back to the same instant.
    pub fn validate(&self) -> Result<()> {
        let fmt = &self.timestamp_format;
        let invalid = || Error::InvalidTimestampFormat(fmt.clone());
        if fmt.is_empty()
            || fmt.contains(['/', '\\'])
            || StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
        {
            return Err(invalid());
        }

        let sample = NaiveDate::from_ymd_opt(2001, 2, 3)
            .and_then(|d| d.and_hms_opt(4, 5, 6))
            .ok_or_else(invalid)?;
        let name = selector::archive_file_name(sample, fmt);
        if selector::parse_timestamp(&name, fmt) != Some(sample) {
            return Err(invalid());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_layout() {
        let settings = Settings::from_config(Settings::builder().unwrap().build().unwrap()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.archive_root, PathBuf::from("saveData"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = Settings::builder()
            .unwrap()
            .set_override("archive_root", "/tmp/backups")
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();
        assert_eq!(settings.archive_root, PathBuf::from("/tmp/backups"));
        assert_eq!(settings.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
    }

    #[test]
    fn rejects_invalid_timestamp_format() {
        let config = Settings::builder()
            .unwrap()
            .set_override("timestamp_format", "%Y%Q")
            .unwrap()
            .build()
            .unwrap();
        let err = Settings::from_config(config).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestampFormat(_)));
    }

    fn rejecting(fmt: &str) -> bool {
        let settings = Settings {
            timestamp_format: fmt.to_string(),
            ..Default::default()
        };
        matches!(settings.validate(), Err(Error::InvalidTimestampFormat(_)))
    }

    #[test]
    fn rejects_formats_that_do_not_read_back() {
        // Day-first with hours only: names exist but never parse as a full instant.
        assert!(rejecting("%d%m%Y%H"));
        assert!(rejecting("%Y%m%d"));
        assert!(rejecting("%Y%m%d%H%M"));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(rejecting("%Y/%m%d%H%M%S"));
        assert!(rejecting("%Y%m%d\\%H%M%S"));
    }

    #[test]
    fn accepts_formats_that_round_trip() {
        assert!(!rejecting(DEFAULT_TIMESTAMP_FORMAT));
        assert!(!rejecting("%d-%m-%Y_%H%M%S"));
        assert!(!rejecting("%Y-%m-%dT%H-%M-%S"));
    }
}
