use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::errors::CoreError;
use super::ocr::TesseractCliOcrService;
use super::pdf::PdfTextExtractor;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedText {
    pub lines: Vec<String>,
    pub ocr_used: bool,
}

/// Turns an uploaded document into OCR lines in top-to-bottom reading order.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_lines(&self, file_name: &str, data: &[u8]) -> anyhow::Result<DetectedText>;
}

pub struct ResumeDocumentParser {
    pdf_text_extractor: PdfTextExtractor,
    ocr_service: TesseractCliOcrService,
}

impl ResumeDocumentParser {
    pub fn new(ocr_service: TesseractCliOcrService) -> Self {
        Self {
            pdf_text_extractor: PdfTextExtractor::new(ocr_service.clone()),
            ocr_service,
        }
    }
}

#[async_trait]
impl TextDetector for ResumeDocumentParser {
    async fn detect_lines(&self, file_name: &str, data: &[u8]) -> anyhow::Result<DetectedText> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|v| v.to_str())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        let (text, ocr_used) = match extension.as_str() {
            "pdf" => {
                self.pdf_text_extractor
                    .extract_text_with_ocr_fallback(data)
                    .await?
            }
            ext if IMAGE_EXTENSIONS.contains(&ext) => {
                (self.ocr_service.extract_text(data, ext).await?, true)
            }
            "docx" => (extract_docx_text(data)?, false),
            "txt" => (String::from_utf8_lossy(data).to_string(), false),
            _ => return Err(CoreError::UnsupportedDocument(file_name.to_string()).into()),
        };

        Ok(DetectedText {
            lines: text_to_lines(&text),
            ocr_used,
        })
    }
}

/// One trimmed, non-empty line per visual line, order preserved.
pub fn text_to_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_docx_text(data: &[u8]) -> anyhow::Result<String> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut document_file = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut lines = Vec::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:p" {
                    in_paragraph = true;
                    current.clear();
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"w:p" {
                    if !current.trim().is_empty() {
                        lines.push(current.trim().to_string());
                    }
                    current.clear();
                    in_paragraph = false;
                }
            }
            Ok(Event::Text(e)) => {
                if in_paragraph {
                    let value = e.xml_content()?.into_owned();
                    current.push_str(&value);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }

        buf.clear();
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn parser() -> ResumeDocumentParser {
        ResumeDocumentParser::new(TesseractCliOcrService::new(
            "/nonexistent/resume-parser-tesseract".to_string(),
            Duration::from_secs(5),
        ))
    }

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn text_to_lines_trims_and_drops_blank_lines() {
        let lines = text_to_lines("  Jane Doe  \n\n\tSkills\r\nRust, Go\n   \n");
        assert_eq!(lines, vec!["Jane Doe", "Skills", "Rust, Go"]);
    }

    #[tokio::test]
    async fn detect_lines_reads_plain_text_without_ocr() {
        let detected = parser()
            .detect_lines("resume.TXT", b"Jane Doe\nSkills\nRust\n")
            .await
            .unwrap();
        assert_eq!(detected.lines, vec!["Jane Doe", "Skills", "Rust"]);
        assert!(!detected.ocr_used);
    }

    #[tokio::test]
    async fn detect_lines_reads_docx_paragraphs() {
        let data = docx_with_paragraphs(&["Jane Doe", "Education", "BSc Physics"]);
        let detected = parser().detect_lines("resume.docx", &data).await.unwrap();
        assert_eq!(detected.lines, vec!["Jane Doe", "Education", "BSc Physics"]);
        assert!(!detected.ocr_used);
    }

    #[tokio::test]
    async fn detect_lines_rejects_unknown_extensions() {
        let err = parser().detect_lines("resume.odt", b"data").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::UnsupportedDocument(_))
        ));
    }

    #[tokio::test]
    async fn detect_lines_surfaces_ocr_failures_for_images() {
        let err = parser().detect_lines("scan.png", b"png").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::Ocr(_))
        ));
    }
}
