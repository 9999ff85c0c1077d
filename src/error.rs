use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    InvalidUrlScheme(String),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Failed to read image size: {0}")]
    ImageError(String),

    #[error("Preview controller is no longer mounted")]
    Unmounted,
}

impl PreviewError {
    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::InvalidUrlScheme(scheme) => {
                debug!(scheme = %scheme, "Skipping link with unsupported scheme");
            }
            PreviewError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            PreviewError::ImageError(e) => {
                warn!(error = %e, "Image size probe failed");
            }
            PreviewError::Unmounted => {
                debug!("Call on an unmounted preview controller");
            }
        }
    }
}
