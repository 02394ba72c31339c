//! PCA Template Preview Library
//!
//! Builds a PDF preview of Phishing Campaign Assessment templates.
//! This library provides functionality to:
//! - Look up template records by identifier and sort them
//! - Escape record content for LaTeX
//! - Render a Mustache template into LaTeX source
//! - Run an external LaTeX compiler in a scratch directory
//!
//! # Example
//!
//! ```no_run
//! use pca_template_preview::config::Config;
//! use pca_template_preview::report::{generate_preview, PreviewOptions};
//! use pca_template_preview::store::open_store;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("config.toml"), None).unwrap();
//! let store = open_store(&config.store).unwrap();
//! let ids = vec!["5c9b7f3e2a1d4e0012345678".parse().unwrap()];
//!
//! let options = PreviewOptions {
//!     resources: config.resources,
//!     compiler: config.compiler,
//!     debug: false,
//! };
//! generate_preview(store.as_ref(), &ids, &options).expect("Failed to generate preview");
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod escape;
pub mod ids;
pub mod report;
pub mod store;

// Re-export commonly used items
pub use error::{Error, Result};
