//! On-disk storage of the generated `data-main` entry file.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LoaderError, Result};
use crate::hash::content_hash;

/// Default main-file name: content hash of the file content plus `.js`
pub fn default_main_name(code: &str) -> String {
    format!("{}.js", content_hash(code))
}

pub struct MainFileStore {
    dir: PathBuf,
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoaderError + '_ {
    move |source| LoaderError::Write {
        path: path.to_path_buf(),
        source,
    }
}

impl MainFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `name`; leading separators are ignored.
    /// Names must stay inside the store directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name.trim_start_matches(|c| c == '/' || c == '\\'));
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

        if escapes || relative.as_os_str().is_empty() {
            return Err(LoaderError::InvalidArgument(format!(
                "Main file name \"{}\" must be a relative path inside {}",
                name,
                self.dir.display()
            )));
        }

        Ok(self.dir.join(relative))
    }

    /// Writes `content` under `name` and returns the full path.
    ///
    /// The content goes to a temporary file next to the target which is then
    /// renamed into place. With `skip_existing` an existing regular file is
    /// left untouched.
    pub fn write(&self, name: &str, content: &str, skip_existing: bool) -> Result<PathBuf> {
        let path = self.path_for(name)?;

        if skip_existing && path.is_file() {
            debug!("Main file {} already exists", path.display());
            return Ok(path);
        }

        let dir = path.parent().unwrap_or(&self.dir);
        fs::create_dir_all(dir).map_err(write_error(dir))?;

        let mut file = NamedTempFile::new_in(dir).map_err(write_error(&path))?;
        file.write_all(content.as_bytes()).map_err(write_error(&path))?;
        file.persist(&path).map_err(|e| LoaderError::Write {
            path: path.clone(),
            source: e.error,
        })?;

        debug!("Wrote main file {}", path.display());
        Ok(path)
    }
}
