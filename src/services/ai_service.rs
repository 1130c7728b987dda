use crate::error::MenuError;
use crate::models::MenuImage;

/// Fixed instruction for a vision call: rules for the model plus the prompt sent with the image.
#[derive(Debug, Clone, Copy)]
pub struct VisionPrompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
}

/// Trait for vision backends (OpenRouter, Gemini, etc.)
///
/// A call is a single stateless request: image plus instruction in, free text out.
/// Nothing is enforced about the shape of the returned text.
#[async_trait::async_trait]
pub trait VisionAnalysisClient: Send + Sync {
    async fn analyze(&self, image: &MenuImage, prompt: &VisionPrompt<'_>) -> Result<String, MenuError>;
}

#[cfg(test)]
pub mod stub {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Canned vision backend for tests.
    pub struct StubVisionClient {
        reply: Result<String, fn() -> MenuError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StubVisionClient {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(err: fn() -> MenuError) -> Self {
            Self {
                reply: Err(err),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl VisionAnalysisClient for StubVisionClient {
        async fn analyze(&self, _image: &MenuImage, _prompt: &VisionPrompt<'_>) -> Result<String, MenuError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make_err) => Err(make_err()),
            }
        }
    }
}
