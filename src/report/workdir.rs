//! Temporary working directory for a preview run
//!
//! The LaTeX compiler resolves assets by relative path, so each run gets a
//! fresh directory holding the Mustache template and a copy of `assets/`, and
//! the process works from inside it until the run ends.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::embedded;
use crate::error::{Error, Result};

/// Template file name, in the resources directory and the working directory
pub const MUSTACHE_FILE: &str = "template_preview.mustache";

/// Static assets directory name
pub const ASSETS_DIR: &str = "assets";

const WORK_DIR_PREFIX: &str = "pca-preview-";

/// Changes the process working directory and restores it when dropped
#[derive(Debug)]
pub struct WorkdirGuard {
    original: PathBuf,
}

impl WorkdirGuard {
    /// Switch into `dir`, remembering where we came from
    pub fn enter(dir: &Path) -> Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(dir)?;
        debug!(from = %original.display(), to = %dir.display(), "entered working directory");
        Ok(WorkdirGuard { original })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.original) {
            warn!(dir = %self.original.display(), error = %e, "could not restore working directory");
        }
    }
}

/// The run's temporary directory
///
/// Normal runs own a [`TempDir`] that is deleted when dropped, whether the run
/// succeeded or not. Debug runs create the directory next to the user's files
/// and keep it.
#[derive(Debug)]
pub enum WorkDir {
    Scoped(TempDir),
    Kept(PathBuf),
}

impl WorkDir {
    /// Create the directory: inside `original` when debugging, else in the system temp dir
    pub fn create(original: &Path, debug: bool) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(WORK_DIR_PREFIX);

        let work_dir = if debug {
            WorkDir::Kept(builder.tempdir_in(original)?.keep())
        } else {
            WorkDir::Scoped(builder.tempdir()?)
        };
        let keep = debug;
        debug!(path = %work_dir.path().display(), keep, "created working directory");
        Ok(work_dir)
    }

    pub fn path(&self) -> &Path {
        match self {
            WorkDir::Scoped(dir) => dir.path(),
            WorkDir::Kept(path) => path,
        }
    }

    /// Delete a scoped directory; a kept one is returned untouched
    pub fn finish(self) -> Result<Option<PathBuf>> {
        match self {
            WorkDir::Scoped(dir) => {
                dir.close()?;
                Ok(None)
            }
            WorkDir::Kept(path) => Ok(Some(path)),
        }
    }
}

/// Put the Mustache template and the assets directory into `work_dir`
///
/// Copies them from `resources` when given, otherwise writes out the copies
/// built into the binary.
pub fn stage_resources(resources: Option<&Path>, work_dir: &Path) -> Result<()> {
    match resources {
        Some(dir) => copy_resources(dir, work_dir),
        None => write_embedded(work_dir),
    }
}

fn copy_resources(resources: &Path, work_dir: &Path) -> Result<()> {
    let template = resources.join(MUSTACHE_FILE);
    if !template.is_file() {
        return Err(Error::Config(format!(
            "template not found: {}",
            template.display()
        )));
    }
    fs::copy(&template, work_dir.join(MUSTACHE_FILE))?;

    let assets = resources.join(ASSETS_DIR);
    if !assets.is_dir() {
        return Err(Error::Config(format!(
            "assets directory not found: {}",
            assets.display()
        )));
    }
    copy_dir(&assets, &work_dir.join(ASSETS_DIR))
}

fn write_embedded(work_dir: &Path) -> Result<()> {
    fs::write(work_dir.join(MUSTACHE_FILE), embedded::TEMPLATE)?;

    let assets = work_dir.join(ASSETS_DIR);
    for (name, content) in embedded::ASSETS {
        let target = assets.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
    }
    debug!(dst = %work_dir.display(), files = embedded::ASSETS.len() + 1, "wrote built-in resources");
    Ok(())
}

/// Recursively copy `src` to `dst`, following symlinks
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    let mut copied = 0usize;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    debug!(src = %src.display(), dst = %dst.display(), files = copied, "copied directory");
    Ok(())
}
