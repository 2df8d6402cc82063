//! Document format conversion
//!
//! Wraps a raster image (receipt photo) into a single-page document
//! container and renders it to PDF with an external headless renderer.
//! Intermediate artifacts live in a scoped temp directory that is removed on
//! success and failure alike; renderer problems surface as
//! `Error::Converter` with the underlying diagnostic.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Default renderer binary (LibreOffice headless mode)
pub const DEFAULT_RENDERER: &str = "soffice";

/// Image-to-PDF converter backed by an external renderer process
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    renderer: PathBuf,
    timeout: Duration,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self {
            renderer: PathBuf::from(DEFAULT_RENDERER),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DocumentConverter {
    pub fn new(renderer: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            renderer: renderer.into(),
            timeout,
        }
    }

    /// Convert an image file to a single-page PDF at `output`
    ///
    /// The image is wrapped in a self-contained HTML page (base64-embedded,
    /// so the renderer needs no side files) inside a temp directory, the
    /// renderer converts that page to PDF, and the result is copied out.
    /// The temp directory is dropped - and with it every intermediate
    /// artifact - on every exit path.
    pub async fn image_to_pdf(&self, input: &Path, output: &Path) -> Result<()> {
        let image = tokio::fs::read(input).await?;
        let workdir = tempfile::tempdir()?;

        let page = workdir.path().join("document.html");
        tokio::fs::write(&page, container_page(input, &image)).await?;

        let rendered = self.render_to_pdf(workdir.path(), &page).await?;
        tokio::fs::copy(&rendered, output).await?;
        debug!(input = %input.display(), output = %output.display(), "conversion complete");
        Ok(())
    }

    /// Invoke the renderer under the configured timeout and locate its output
    async fn render_to_pdf(&self, workdir: &Path, page: &Path) -> Result<PathBuf> {
        let run = Command::new(&self.renderer)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workdir)
            .arg(page)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(Error::Converter(format!(
                    "failed to launch renderer {}: {}",
                    self.renderer.display(),
                    err
                )))
            }
            Err(_) => {
                return Err(Error::Converter(format!(
                    "renderer {} timed out after {:?}",
                    self.renderer.display(),
                    self.timeout
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Converter(format!(
                "renderer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let rendered = page.with_extension("pdf");
        if !rendered.exists() {
            return Err(Error::Converter(format!(
                "renderer produced no output at {}",
                rendered.display()
            )));
        }
        Ok(rendered)
    }
}

/// Build the single-page container document embedding the image
fn container_page(source: &Path, image: &[u8]) -> String {
    let mime = match source.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><style>\n\
         @page {{ margin: 1cm; }}\n\
         body {{ margin: 0; }}\n\
         img {{ width: 100%; }}\n\
         </style></head>\n\
         <body><img src=\"data:{};base64,{}\" alt=\"\"></body>\n</html>\n",
        mime, encoded
    )
}
