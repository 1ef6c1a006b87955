//! Card images prepared for embedding in a request

use crate::VlmError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// A base64-encoded image with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    mime: &'static str,
    data: String,
}

impl ImageInput {
    /// Encode raw image bytes
    pub fn from_bytes(bytes: &[u8], mime: &'static str) -> Self {
        Self {
            mime,
            data: STANDARD.encode(bytes),
        }
    }

    /// Read and encode an image file; the MIME type follows the extension
    pub async fn from_path(path: &Path) -> Result<Self, VlmError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| VlmError::Image(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_bytes(&bytes, mime_for(path)))
    }

    /// MIME type of the image
    pub fn mime(&self) -> &str {
        self.mime
    }

    /// Base64 payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// `data:` URL as embedded in the request body
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// MIME type for an image path, by extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_data_url() {
        let image = ImageInput::from_bytes(b"hello", "image/jpeg");
        assert_eq!(image.data(), "aGVsbG8=");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("card.jpg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("card.JPEG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("card.png")), "image/png");
        assert_eq!(mime_for(Path::new("card")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"hello").unwrap();

        let image = ImageInput::from_path(file.path()).await.unwrap();
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.data(), "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = ImageInput::from_path(Path::new("/nonexistent/card.jpg")).await;
        assert!(matches!(result, Err(VlmError::Image(_))));
    }
}
