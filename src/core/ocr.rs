use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tokio::time::timeout;

use super::errors::CoreError;

const PAGE_PREFIX: &str = "page";
const RASTER_DPI: &str = "300";

#[derive(Clone)]
pub struct TesseractCliOcrService {
    pub tesseract_executable_path: String,
    pub pdftoppm_executable_path: String,
    pub timeout: Duration,
}

impl TesseractCliOcrService {
    pub fn new(tesseract_executable_path: String, timeout: Duration) -> Self {
        Self {
            tesseract_executable_path,
            pdftoppm_executable_path: "pdftoppm".to_string(),
            timeout,
        }
    }

    pub fn with_pdftoppm(mut self, pdftoppm_executable_path: String) -> Self {
        self.pdftoppm_executable_path = pdftoppm_executable_path;
        self
    }

    /// Runs tesseract over an image and returns its raw stdout text.
    /// `extension` keeps the temp file recognisable to tesseract's image loaders.
    pub async fn extract_text(&self, data: &[u8], extension: &str) -> anyhow::Result<String> {
        let temp_dir = ocr_temp_dir()?;
        let input_path: PathBuf = temp_dir.path().join(format!("resume.{extension}"));
        tokio::fs::write(&input_path, data)
            .await
            .context("failed to write OCR input")?;

        self.run_tesseract(&input_path).await
    }

    /// Tesseract cannot read PDFs, so pages are rendered to PNG with pdftoppm
    /// first and recognised one by one in page order.
    pub async fn extract_pdf_text(&self, data: &[u8]) -> anyhow::Result<String> {
        let temp_dir = ocr_temp_dir()?;
        let input_path = temp_dir.path().join("resume.pdf");
        tokio::fs::write(&input_path, data)
            .await
            .context("failed to write OCR input")?;

        let mut command = Command::new(&self.pdftoppm_executable_path);
        command
            .arg("-r")
            .arg(RASTER_DPI)
            .arg("-png")
            .arg(&input_path)
            .arg(temp_dir.path().join(PAGE_PREFIX));
        self.run(&self.pdftoppm_executable_path, command).await?;

        let pages = rendered_pages(temp_dir.path()).await?;
        if pages.is_empty() {
            return Err(CoreError::Ocr("pdftoppm rendered no pages".to_string()).into());
        }

        let mut text = String::new();
        for page in pages {
            let page_text = self.run_tesseract(&page).await?;
            text.push_str(&page_text);
            if !text.ends_with('\n') {
                text.push('\n');
            }
        }

        Ok(text)
    }

    async fn run_tesseract(&self, input_path: &Path) -> anyhow::Result<String> {
        let mut command = Command::new(&self.tesseract_executable_path);
        command.arg(input_path).arg("stdout").arg("-l").arg("eng");
        let output = self.run(&self.tesseract_executable_path, command).await?;

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run(&self, program: &str, mut command: Command) -> anyhow::Result<Output> {
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(result) => {
                result.map_err(|err| CoreError::Ocr(format!("failed to run {program}: {err}")))?
            }
            Err(_) => {
                return Err(CoreError::Ocr(format!(
                    "{program} timed out after {}s",
                    self.timeout.as_secs()
                ))
                .into())
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Ocr(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        Ok(output)
    }
}

fn ocr_temp_dir() -> anyhow::Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("resume-ocr-")
        .tempdir()
        .context("failed to create OCR temp dir")
}

/// pdftoppm writes `page-1.png`, or `page-01.png` for longer documents.
async fn rendered_pages(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let number = path
            .file_stem()
            .and_then(|v| v.to_str())
            .and_then(|stem| stem.strip_prefix(PAGE_PREFIX))
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u32>().ok());

        let is_png = path.extension().and_then(|v| v.to_str()) == Some("png");
        if let (Some(number), true) = (number, is_png) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
