//! External LaTeX compiler invocation

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::DEFAULT_COMPILER;
use crate::error::{Error, Result};

/// How to run the LaTeX compiler
///
/// The `.tex` file name is appended after `args`. Each of the `passes` runs uses
/// identical arguments and must exit with status zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfCompiler {
    pub program: String,
    pub args: Vec<String>,
    pub passes: u32,
}

impl Default for PdfCompiler {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMPILER.to_string(),
            args: Vec::new(),
            passes: 1,
        }
    }
}

impl PdfCompiler {
    /// Compile `tex_file` inside `work_dir`
    ///
    /// In debug mode the compiler's output and diagnostics both go to standard
    /// output, otherwise they are discarded.
    pub fn compile(&self, tex_file: &str, work_dir: &Path, debug: bool) -> Result<()> {
        for pass in 1..=self.passes.max(1) {
            debug!(program = %self.program, pass, tex_file, "running compiler");

            let (stdout, stderr) = if debug {
                (Stdio::from(io::stdout()), Stdio::from(io::stdout()))
            } else {
                (Stdio::null(), Stdio::null())
            };

            let status = Command::new(&self.program)
                .args(&self.args)
                .arg(tex_file)
                .current_dir(work_dir)
                .stdin(Stdio::null())
                .stdout(stdout)
                .stderr(stderr)
                .status()
                .map_err(|source| Error::CompilerUnavailable {
                    program: self.program.clone(),
                    source,
                })?;

            if !status.success() {
                return Err(Error::compilation(&self.program, status));
            }
        }

        info!(program = %self.program, passes = self.passes, "compilation finished");
        Ok(())
    }
}
