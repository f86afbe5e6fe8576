//! External HTML-to-PDF converter, e.g. `weasyprint` or `wkhtmltopdf`.
//!
//! The converter is invoked as `<program> <input.html> <output.pdf>`; the input
//! file is a scoped temporary removed when the call returns.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::render::{PdfEngine, RenderError};

pub struct CommandEngine {
    program: String,
    scratch_dir: PathBuf,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn failure(&self, message: String) -> RenderError {
        RenderError::Engine {
            engine: self.program.clone(),
            message,
        }
    }
}

impl PdfEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn write_pdf(&self, html: &str, output: &Path) -> Result<(), RenderError> {
        let mut input = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(".html")
            .tempfile_in(&self.scratch_dir)?;
        input.write_all(html.as_bytes())?;
        input.flush()?;

        debug!("Running {} {}", self.program, input.path().display());
        let result = Command::new(&self.program)
            .arg(input.path())
            .arg(output)
            .output()
            .map_err(|e| self.failure(format!("could not start converter: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let message = match stderr.trim() {
                "" => format!("exited with {}", result.status),
                text => text.to_string(),
            };
            return Err(self.failure(message));
        }

        input.close()?;
        Ok(())
    }
}
