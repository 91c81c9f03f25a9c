//! Temporary project layouts
//!
//! A [`TestProject`] is a directory holding a `lineage.toml` and one
//! script location per module, as a user project would.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{TestError, TestResult};

pub const CONFIG_FILE: &str = "lineage.toml";

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> TestResult<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join(CONFIG_FILE)
    }

    /// Write `lineage.toml` verbatim
    pub fn write_config(&self, contents: &str) -> TestResult<PathBuf> {
        let path = self.config_path();
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a config with one section per module, all pointing at `url`
    pub fn write_modules(&self, url: &str, modules: &[&str]) -> TestResult<PathBuf> {
        let mut contents = String::new();
        for module in modules {
            self.add_module(module)?;
            contents.push_str(&format!(
                "[{module}]\nurl = \"{url}\"\nscript_location = \"{module}\"\n\n"
            ));
        }
        self.write_config(&contents)
    }

    /// Create `<module>/versions` and return it
    pub fn add_module(&self, module: &str) -> TestResult<PathBuf> {
        let versions = self.versions_dir(module);
        fs::create_dir_all(&versions)?;
        Ok(versions)
    }

    pub fn versions_dir(&self, module: &str) -> PathBuf {
        self.root().join(module).join("versions")
    }

    /// Write a revision file into a module's versions directory
    pub fn write_revision(&self, module: &str, file_name: &str, contents: &str) -> TestResult<PathBuf> {
        let versions = self.add_module(module)?;
        let path = versions.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Revision files of a module, sorted by file name
    pub fn revision_files(&self, module: &str) -> TestResult<Vec<PathBuf>> {
        let versions = self.versions_dir(module);
        if !versions.is_dir() {
            return Err(TestError::Setup(format!(
                "No versions directory for module '{}'",
                module
            )));
        }
        let mut files: Vec<PathBuf> = fs::read_dir(versions)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_modules_layout() {
        let project = TestProject::new().unwrap();
        let path = project.write_modules("sqlite://app.db", &["one", "two"]).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[one]"));
        assert!(contents.contains("script_location = \"two\""));
        assert!(project.versions_dir("one").is_dir());
        assert!(project.revision_files("two").unwrap().is_empty());
        assert!(project.revision_files("three").is_err());
    }

    #[test]
    fn test_write_revision() {
        let project = TestProject::new().unwrap();
        project.write_revision("one", "abc_first.sql", "-- Revision: abc\n").unwrap();
        project.write_revision("one", "notes.txt", "ignored").unwrap();
        assert_eq!(project.revision_files("one").unwrap().len(), 1);
    }
}
