//! Preview generation pipeline
//!
//! `fetch → stage working directory → intermediate JSON → rendered .tex → PDF → finalize`
//!
//! Each stage hands its output to the next; nothing is accumulated between
//! runs. Normal runs leave exactly one PDF in the invocation directory and no
//! temporary files. Debug runs leave every intermediate file in a directory
//! next to the user's files and move nothing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::compile::PdfCompiler;
use super::intermediate::IntermediateDocument;
use super::render::render_file;
use super::workdir::{stage_resources, WorkDir, WorkdirGuard, MUSTACHE_FILE};
use crate::date::{generation_time, output_file_name};
use crate::error::{Error, Result};
use crate::store::{TemplateId, TemplateRecord, TemplateStore};

/// Serialized intermediate document
pub const REPORT_JSON: &str = "template_preview.json";
/// Rendered LaTeX source
pub const REPORT_TEX: &str = "template_preview.tex";
/// Compiler output
pub const REPORT_PDF: &str = "template_preview.pdf";

/// Options for generating a preview
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Directory holding the Mustache template and `assets/`; `None` uses
    /// the built-in copies
    pub resources: Option<PathBuf>,
    /// LaTeX compiler settings
    pub compiler: PdfCompiler,
    /// Keep intermediate files and show compiler output
    pub debug: bool,
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOutcome {
    /// Timestamp used for the date macro and the output name
    pub generated_at: NaiveDateTime,
    /// Number of templates in the preview
    pub template_count: usize,
    /// Final PDF (normal runs)
    pub output: Option<PathBuf>,
    /// Kept working directory (debug runs)
    pub work_dir: Option<PathBuf>,
}

/// Generate a preview of `ids`, timestamped now
///
/// # Example
///
/// ```no_run
/// use pca_template_preview::report::{generate_preview, PdfCompiler, PreviewOptions};
/// use pca_template_preview::store::JsonFileStore;
/// use std::path::Path;
///
/// let store = JsonFileStore::open(Path::new("templates.json")).unwrap();
/// let ids = vec!["5c9b7f3e2a1d4e0012345678".parse().unwrap()];
/// let options = PreviewOptions {
///     resources: None,
///     compiler: PdfCompiler::default(),
///     debug: false,
/// };
///
/// let outcome = generate_preview(&store, &ids, &options).unwrap();
/// println!("{:?}", outcome.output);
/// ```
pub fn generate_preview(
    store: &dyn TemplateStore,
    ids: &[TemplateId],
    options: &PreviewOptions,
) -> Result<PreviewOutcome> {
    generate_preview_at(store, ids, options, generation_time())
}

/// Generate a preview of `ids` with an explicit generation time
pub fn generate_preview_at(
    store: &dyn TemplateStore,
    ids: &[TemplateId],
    options: &PreviewOptions,
    generated_at: NaiveDateTime,
) -> Result<PreviewOutcome> {
    println!(" running DB queries");
    let records = store.find_templates(ids)?;
    let template_count = records.len();
    info!(templates = template_count, "fetched templates");

    let original = env::current_dir()?;
    let resources = options.resources.as_ref().map(|dir| original.join(dir));

    let work_dir = WorkDir::create(&original, options.debug)?;
    stage_resources(resources.as_deref(), work_dir.path())?;

    let pdf = {
        let _guard = WorkdirGuard::enter(work_dir.path())?;
        assemble(records, &generated_at, work_dir.path(), options)?
    };

    let output = if options.debug {
        None
    } else {
        let destination = original.join(output_file_name(&generated_at));
        move_file(&pdf, &destination)?;
        info!(output = %destination.display(), "preview written");
        Some(destination)
    };

    let work_dir = work_dir.finish()?;
    if let Some(dir) = &work_dir {
        info!(work_dir = %dir.display(), "kept working directory");
    }

    Ok(PreviewOutcome {
        generated_at,
        template_count,
        output,
        work_dir,
    })
}

/// Build, render and compile inside the staged working directory
fn assemble(
    records: Vec<TemplateRecord>,
    generated_at: &NaiveDateTime,
    work: &Path,
    options: &PreviewOptions,
) -> Result<PathBuf> {
    let json_path = work.join(REPORT_JSON);
    IntermediateDocument::build(records, generated_at).write_json(&json_path)?;
    debug!(path = %json_path.display(), "wrote intermediate document");

    let tex_path = work.join(REPORT_TEX);
    render_file(&work.join(MUSTACHE_FILE), &json_path, &tex_path)?;

    println!(" assembling PDF");
    options.compiler.compile(REPORT_TEX, work, options.debug)?;

    let pdf = work.join(REPORT_PDF);
    if !pdf.is_file() {
        return Err(Error::CompilationFailure {
            program: options.compiler.program.clone(),
            status: format!("exited successfully but produced no {}", REPORT_PDF),
        });
    }
    Ok(pdf)
}

/// Move a file, copying when a rename crosses filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
