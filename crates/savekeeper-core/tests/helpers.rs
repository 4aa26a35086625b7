#![allow(dead_code)]

use savekeeper_core::{Project, ProjectPath, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// A temporary workspace with an archive root and one project whose live
/// save data lives at `<tmp>/data/game1/save`.
pub struct TestEnv {
    pub temp_dir: tempfile::TempDir,
    pub settings: Settings,
    pub project: Project,
}

impl TestEnv {
    pub fn save_data(&self) -> &Path {
        self.project.save_data().unwrap()
    }

    pub fn game_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data").join("game1")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.settings.archive_root.join(&self.project.name)
    }
}

/// Helper function to set up a test environment with a populated save directory.
pub fn setup_test_env() -> TestEnv {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let archive_root = temp_dir.path().join("saveData");
    let save_data = temp_dir.path().join("data").join("game1").join("save");

    fs::create_dir_all(save_data.join("slot1")).unwrap();
    fs::write(save_data.join("profile.json"), r#"{"level":3}"#).unwrap();
    fs::write(save_data.join("slot1").join("world.bin"), [0u8, 1, 2, 3, 255]).unwrap();

    let settings = Settings {
        archive_root,
        ..Default::default()
    };
    let project = project("game1", Some(save_data));

    TestEnv {
        temp_dir,
        settings,
        project,
    }
}

pub fn project(name: &str, save_data: Option<PathBuf>) -> Project {
    Project {
        name: name.to_string(),
        path: ProjectPath {
            save_data,
            ..Default::default()
        },
    }
}

/// Helper function to initialize the tracing subscriber for tests.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Every file under `root`, relative to it, with its contents.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    collect(root, root, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            out.push((relative, fs::read(&path).unwrap()));
        }
    }
}
