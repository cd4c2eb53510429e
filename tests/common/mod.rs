#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use report_card_ingest::{
    data::Cell,
    release::{LayoutKind, Release},
    schema::Schema,
    workbook,
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Reads a delimited fixture the way the CLI reads a layout export.
pub fn fixture_rows(name: &str) -> Vec<Vec<Cell>> {
    workbook::read_rows(&fixture_path(name), None, encoding_rs::UTF_8).expect("read fixture rows")
}

/// Compiles one of the 2015 layout fixtures.
pub fn compiled_fixture(name: &str, kind: LayoutKind) -> Schema {
    Release::Y2015
        .compiler(kind)
        .compile(&fixture_rows(name))
        .expect("compile fixture layout")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Reads a file written under the workspace.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read temp file")
    }
}
