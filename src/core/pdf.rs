use super::ocr::TesseractCliOcrService;

const MIN_EMBEDDED_TEXT_CHARS: usize = 50;

pub struct PdfTextExtractor {
    ocr_service: TesseractCliOcrService,
}

impl PdfTextExtractor {
    pub fn new(ocr_service: TesseractCliOcrService) -> Self {
        Self { ocr_service }
    }

    /// Prefers the PDF's embedded text layer; scanned documents with little or
    /// no embedded text go through OCR instead.
    pub async fn extract_text_with_ocr_fallback(
        &self,
        data: &[u8],
    ) -> anyhow::Result<(String, bool)> {
        match self.extract_pdf_text(data) {
            Ok(text) if has_usable_text(&text) => Ok((text, false)),
            Ok(_) => {
                tracing::debug!("embedded PDF text too short, falling back to OCR");
                Ok((self.ocr_service.extract_pdf_text(data).await?, true))
            }
            Err(err) => {
                tracing::debug!("embedded PDF text unavailable ({err}), falling back to OCR");
                Ok((self.ocr_service.extract_pdf_text(data).await?, true))
            }
        }
    }

    fn extract_pdf_text(&self, data: &[u8]) -> anyhow::Result<String> {
        let text = pdf_extract::extract_text_from_mem(data)?;
        Ok(text)
    }
}

fn has_usable_text(text: &str) -> bool {
    text.trim().len() >= MIN_EMBEDDED_TEXT_CHARS
}
