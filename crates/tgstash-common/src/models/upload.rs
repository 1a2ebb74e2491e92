//! Parts of an inbound multipart upload form.

/// A multipart part that carries file content.
///
/// Only parts sent with a `filename` parameter qualify; plain text fields never do.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Name recorded for the file, `"image"` when the client sent none.
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("image")
    }

    pub fn mime(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }
}

/// A form value as submitted under one of the accepted upload field names.
#[derive(Debug, Clone)]
pub enum FormPart {
    File(UploadedFile),
    Text(String),
    /// A file part that grew past the upload limit; its content was discarded.
    Oversized,
}

impl FormPart {
    /// Empty text values behave as if the field had not been sent.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Text(text) if text.is_empty())
    }
}
