//! Configuration file handling
//!
//! The configuration is a TOML file with one table per section. Each section
//! says where the template store lives (a MongoDB `uri` plus `database`, or a
//! `store` export file) and, optionally, where the companion resources are and
//! how to invoke the LaTeX compiler. Without `resources` the template and
//! assets compiled into the binary are used.
//!
//! ```toml
//! [default]
//! uri = "mongodb://pca-db.example.com:27017"
//! database = "pca"
//!
//! [offline]
//! store = "templates.json"
//! resources = "resources"
//! compiler = "xelatex"
//! compiler_args = ["-interaction=nonstopmode"]
//! passes = 2
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::report::PdfCompiler;
use crate::store::mongo::DEFAULT_COLLECTION;
use crate::store::StoreSource;

/// Section used when none is requested
pub const DEFAULT_SECTION: &str = "default";

/// Default LaTeX compiler
pub const DEFAULT_COMPILER: &str = "xelatex";

/// Upper bound on compiler passes
pub const MAX_PASSES: u32 = 3;

/// One section of the configuration file, as written
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
    store: Option<PathBuf>,
    uri: Option<String>,
    database: Option<String>,
    collection: Option<String>,
    resources: Option<PathBuf>,
    compiler: Option<String>,
    #[serde(default)]
    compiler_args: Vec<String>,
    passes: Option<u32>,
}

/// Resolved settings for one configuration section
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where template records come from
    pub store: StoreSource,
    /// Directory holding `template_preview.mustache` and `assets/`; `None`
    /// uses the built-in copies
    pub resources: Option<PathBuf>,
    /// How to run the LaTeX compiler
    pub compiler: PdfCompiler,
}

impl Config {
    /// Load `section` (or `[default]`) from the file at `path`
    pub fn load(path: &Path, section: Option<&str>) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml(&content, section, base)
    }

    /// Parse configuration text, resolving relative paths against `base`
    pub fn from_toml(content: &str, section: Option<&str>, base: &Path) -> Result<Self> {
        let mut sections: BTreeMap<String, RawSection> = toml::from_str(content)?;
        let name = section.unwrap_or(DEFAULT_SECTION);

        let raw = sections.remove(name).ok_or_else(|| {
            let available: Vec<&str> = sections.keys().map(String::as_str).collect();
            Error::Config(format!(
                "section [{}] not found (available: {})",
                name,
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            ))
        })?;

        let passes = raw.passes.unwrap_or(1);
        if passes == 0 || passes > MAX_PASSES {
            return Err(Error::Config(format!(
                "passes must be between 1 and {}, got {}",
                MAX_PASSES, passes
            )));
        }

        let store = match (raw.store, raw.uri) {
            (Some(path), None) => StoreSource::File(base.join(path)),
            (None, Some(uri)) => StoreSource::Mongo {
                uri,
                database: raw.database.ok_or_else(|| {
                    Error::Config(format!("section [{}]: uri requires database", name))
                })?,
                collection: raw
                    .collection
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            },
            (Some(_), Some(_)) => {
                return Err(Error::Config(format!(
                    "section [{}]: set either store or uri, not both",
                    name
                )))
            }
            (None, None) => {
                return Err(Error::Config(format!(
                    "section [{}]: no template store (set uri or store)",
                    name
                )))
            }
        };

        Ok(Config {
            store,
            resources: raw.resources.map(|p| base.join(p)),
            compiler: PdfCompiler {
                program: raw.compiler.unwrap_or_else(|| DEFAULT_COMPILER.to_string()),
                args: raw.compiler_args,
                passes,
            },
        })
    }
}

/// Default configuration file location: `<config dir>/pca-template-preview/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    Ok(base.join("pca-template-preview").join("config.toml"))
}
