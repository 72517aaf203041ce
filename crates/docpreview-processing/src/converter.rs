//! Converter invoker - renders office documents to PDF

use crate::command::{CommandRunner, ProcessError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONVERT_TO: &str = "pdf:writer_pdf_Export";
const OUTPUT_EXTENSION: &str = "pdf";

pub struct DocumentConverter {
    converter_path: String,
    runner: Arc<dyn CommandRunner>,
}

impl DocumentConverter {
    pub fn new(converter_path: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            converter_path: converter_path.into(),
            runner,
        }
    }

    /// Where the renderer writes its output for `source`
    ///
    /// The renderer keeps the base name and swaps the extension.
    pub fn output_path(source: &Path, out_dir: &Path) -> PathBuf {
        let mut name = source
            .file_stem()
            .unwrap_or(source.as_os_str())
            .to_os_string();
        name.push(".");
        name.push(OUTPUT_EXTENSION);
        out_dir.join(name)
    }

    /// Render `source` into `out_dir` and return the rendered file's path.
    ///
    /// Blocks until the renderer exits. A non-zero exit, or a zero exit that
    /// produced no file, is an error.
    #[tracing::instrument(skip_all, fields(
        process.executable.path = %self.converter_path,
        source = %source.display()
    ))]
    pub async fn convert(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, ProcessError> {
        let start = std::time::Instant::now();

        tokio::fs::create_dir_all(out_dir).await?;

        let args: Vec<OsString> = vec![
            "--invisible".into(),
            "--convert-to".into(),
            CONVERT_TO.into(),
            "--outdir".into(),
            out_dir.as_os_str().to_owned(),
            source.as_os_str().to_owned(),
        ];

        let output = self.runner.run(&self.converter_path, &args).await?;
        if !output.success() {
            return Err(ProcessError::failed(&self.converter_path, &output));
        }

        let rendered = Self::output_path(source, out_dir);
        if !tokio::fs::try_exists(&rendered).await.unwrap_or(false) {
            return Err(ProcessError::MissingOutput(rendered));
        }

        tracing::info!(
            output = %rendered.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document conversion completed"
        );

        Ok(rendered)
    }
}
