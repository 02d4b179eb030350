use crate::error::AnalyzeError;

/// Everything the uploader accepts. The list is advisory: extensions are
/// checked here, but whether the bytes are actually decodable is the AI
/// service's call (RAW and vector formats in particular may be bounced).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", // common
    "tiff", "tif", "svg", "ico", "eps", "psd", // additional
    "raw", "cr2", "nef", "arw", "dng", // camera RAW
    "heic", "heif", // Apple
];

/// One uploaded image, held in memory for the duration of the session.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl UploadedImage {
    /// Builds an upload from a multipart field, rejecting empty payloads and
    /// file types outside the allow-list before anything goes over the wire.
    pub fn new(
        bytes: Vec<u8>,
        file_name: String,
        content_type: Option<String>,
    ) -> Result<Self, AnalyzeError> {
        if bytes.is_empty() {
            return Err(AnalyzeError::Input("uploaded image is empty".into()));
        }

        let ext = extension(&file_name);
        match ext.as_deref() {
            Some(e) if ALLOWED_EXTENSIONS.contains(&e) => {}
            _ => {
                return Err(AnalyzeError::Input(format!(
                    "unsupported file type for '{file_name}' - supported: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                )));
            }
        }

        let mime = content_type
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or_else(|| guess_mime(ext.as_deref()));

        Ok(UploadedImage {
            bytes,
            file_name,
            mime,
        })
    }
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// MIME type for the outbound inline_data part, from the file extension.
fn guess_mime(ext: Option<&str>) -> String {
    let mime = match ext {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tiff" | "tif") => "image/tiff",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        // RAW/EPS/PSD have no stable MIME the API recognizes; let the
        // service decide what to do with the bytes.
        _ => "application/octet-stream",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allow_listed_extensions() {
        let img = UploadedImage::new(vec![1, 2, 3], "photo.JPEG".into(), None).unwrap();
        assert_eq!(img.mime, "image/jpeg");

        let img = UploadedImage::new(vec![1], "diagram.png".into(), None).unwrap();
        assert_eq!(img.mime, "image/png");
    }

    #[test]
    fn rejects_unknown_extensions() {
        let err = UploadedImage::new(vec![1], "document.pdf".into(), None).unwrap_err();
        assert!(matches!(err, AnalyzeError::Input(_)));

        let err = UploadedImage::new(vec![1], "noextension".into(), None).unwrap_err();
        assert!(matches!(err, AnalyzeError::Input(_)));
    }

    #[test]
    fn rejects_empty_payload_before_extension_check() {
        let err = UploadedImage::new(Vec::new(), "photo.png".into(), None).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn browser_content_type_wins_over_extension_guess() {
        let img = UploadedImage::new(
            vec![1],
            "shot.heic".into(),
            Some("image/heif-sequence".into()),
        )
        .unwrap();
        assert_eq!(img.mime, "image/heif-sequence");

        // Non-image content types from the browser are ignored.
        let img = UploadedImage::new(
            vec![1],
            "shot.png".into(),
            Some("application/octet-stream".into()),
        )
        .unwrap();
        assert_eq!(img.mime, "image/png");
    }

    #[test]
    fn raw_formats_fall_back_to_octet_stream() {
        let img = UploadedImage::new(vec![1], "dsc0001.cr2".into(), None).unwrap();
        assert_eq!(img.mime, "application/octet-stream");
    }
}
