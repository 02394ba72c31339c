//! Preview document assembly

pub mod compile;
pub mod embedded;
pub mod intermediate;
pub mod pipeline;
pub mod render;
pub mod workdir;

// Re-export commonly used items
pub use compile::PdfCompiler;
pub use intermediate::IntermediateDocument;
pub use pipeline::{
    generate_preview, generate_preview_at, PreviewOptions, PreviewOutcome, REPORT_JSON,
    REPORT_PDF, REPORT_TEX,
};
pub use render::{render_file, render_template, Template};
pub use workdir::{stage_resources, WorkDir, WorkdirGuard, ASSETS_DIR, MUSTACHE_FILE};
