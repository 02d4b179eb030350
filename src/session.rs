use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::AnalyzeError;
use crate::gemini::VisionBackend;
use crate::prompts;
use crate::upload::UploadedImage;

/// Outcome of one analysis, kept around until the next one overwrites it
/// so the user can still download it.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub text: String,
    pub file_name: String,
    pub model: String,
    pub elapsed_ms: u128,
}

/// Text-file rendition of the last result, for the download button.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// One interactive session: validates the (image, prompt) pair, makes
/// exactly one backend call per analysis, and remembers the last success.
pub struct Session {
    backend: Arc<dyn VisionBackend>,
    last: Mutex<Option<AnalysisResult>>,
}

impl Session {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Session {
            backend,
            last: Mutex::new(None),
        }
    }

    /// The whole request/response round trip. Input validation happens
    /// before any bytes leave the process.
    pub async fn analyze(
        &self,
        image: Option<UploadedImage>,
        prompt: &str,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let image = image.ok_or_else(|| AnalyzeError::Input("no image uploaded".into()))?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AnalyzeError::Input("prompt must not be empty".into()));
        }

        let effective = prompts::effective_prompt(prompt, &image.file_name);
        if effective != prompt {
            tracing::info!(file = %image.file_name, "sequence diagram detected, using specialized prompt");
        }

        let start = Instant::now();
        let reply = self.backend.generate(&image, effective).await?;
        let result = AnalysisResult {
            text: reply.text,
            file_name: image.file_name,
            model: reply.model,
            elapsed_ms: start.elapsed().as_millis(),
        };

        *self.last.lock().unwrap() = Some(result.clone());
        Ok(result)
    }

    /// The last successful result as a downloadable text file, if any.
    pub fn export(&self) -> Option<ExportFile> {
        self.last.lock().unwrap().as_ref().map(|r| ExportFile {
            file_name: format!("image_analysis_{}.txt", r.file_name),
            contents: r.text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::RemoteError;
    use crate::gemini::GeneratedAnalysis;

    /// Canned backend that counts how often it is called.
    struct StubBackend {
        reply: Result<String, fn() -> AnalyzeError>,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn ok(text: &str) -> Self {
            StubBackend {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: fn() -> AnalyzeError) -> Self {
            StubBackend {
                reply: Err(err),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VisionBackend for StubBackend {
        async fn generate(
            &self,
            _image: &UploadedImage,
            _prompt: &str,
        ) -> Result<GeneratedAnalysis, AnalyzeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(GeneratedAnalysis {
                    text: text.clone(),
                    model: "stub-model".to_string(),
                }),
                Err(make) => Err(make()),
            }
        }
    }

    fn photo() -> UploadedImage {
        UploadedImage::new(vec![0xFF, 0xD8, 0xFF], "cat.jpg".into(), None).unwrap()
    }

    #[tokio::test]
    async fn valid_pair_makes_one_call_and_returns_text_verbatim() {
        let backend = Arc::new(StubBackend::ok("A tabby cat on a windowsill."));
        let session = Session::new(backend.clone());

        let result = session
            .analyze(Some(photo()), "Describe this image in detail")
            .await
            .unwrap();

        assert_eq!(result.text, "A tabby cat on a windowsill.");
        assert_eq!(result.model, "stub-model");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn missing_image_fails_before_any_call() {
        let backend = Arc::new(StubBackend::ok("unused"));
        let session = Session::new(backend.clone());

        let err = session
            .analyze(None, "Describe this image in detail")
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::Input(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn blank_prompt_fails_before_any_call() {
        let backend = Arc::new(StubBackend::ok("unused"));
        let session = Session::new(backend.clone());

        for prompt in ["", "   ", "\n\t"] {
            let err = session.analyze(Some(photo()), prompt).await.unwrap_err();
            assert!(matches!(err, AnalyzeError::Input(_)));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn quota_failure_is_surfaced_and_leaves_no_result() {
        let backend = Arc::new(StubBackend::failing(|| RemoteError::Quota.into()));
        let session = Session::new(backend.clone());

        let err = session
            .analyze(Some(photo()), "Describe this image in detail")
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::Remote(RemoteError::Quota)));
        assert_eq!(backend.calls(), 1);
        assert!(session.export().is_none());
    }

    #[tokio::test]
    async fn export_matches_the_last_result() {
        let backend = Arc::new(StubBackend::ok("First analysis."));
        let session = Session::new(backend);

        assert!(session.export().is_none());

        session
            .analyze(Some(photo()), "What is the main subject of this image?")
            .await
            .unwrap();

        let export = session.export().unwrap();
        assert_eq!(export.file_name, "image_analysis_cat.jpg.txt");
        assert_eq!(export.contents, "First analysis.");
    }

    #[tokio::test]
    async fn second_analysis_overwrites_the_first() {
        let backend = Arc::new(StubBackend::ok("Second analysis."));
        let session = Session::new(backend);

        session
            .analyze(Some(photo()), "Describe this image in detail")
            .await
            .unwrap();
        let first = session.export().unwrap();

        session
            .analyze(
                Some(UploadedImage::new(vec![1], "dog.png".into(), None).unwrap()),
                "Describe this image in detail",
            )
            .await
            .unwrap();
        let second = session.export().unwrap();

        assert_eq!(first.contents, second.contents);
        assert_eq!(second.file_name, "image_analysis_dog.png.txt");
    }
}
