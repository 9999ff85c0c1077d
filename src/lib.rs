use async_trait::async_trait;

mod animation;
mod cache;
mod controller;
mod coordinator;
mod error;
mod extractor;
mod fetcher;
mod linkify;
#[cfg(feature = "logging")]
mod logging;
mod options;
mod preview_generator;
mod utils;
mod view;

#[cfg(feature = "cache")]
pub use cache::Cache;
pub use animation::{ease_out_quad, RevealAnimator, Transition};
pub use controller::{ControllerState, PreviewController, RenderFrame};
pub use coordinator::FetchCoordinator;
pub use error::PreviewError;
pub use extractor::{ExtractedPage, MetadataExtractor};
pub use fetcher::{FetchResult, Fetcher, FetcherConfig};
pub use linkify::{first_url, linkify, LinkSpan, SpanKind, Spans};
#[cfg(feature = "logging")]
pub use logging::{log_preview_card, setup_logging, LogConfig};
pub use options::{
    Color, DisplayOptions, FontWeight, ImageBuilder, Insets, LinkPressHandler, PreviewCallback,
    PreviewProps, TextStyle, DEFAULT_ANIMATION_DURATION,
};
pub use preview_generator::LinkPreviewGenerator;
pub use view::{
    open_link, render, select_presentation, ImageNode, MessageView, MinimizedContent, Node,
    Presentation, Reveal, TextNode, UrlLauncher, MINIMIZED_IMAGE_SIZE,
};

/// Metadata describing the first link found in a message.
///
/// The host owns this value: it receives it through
/// [`DisplayOptions::on_preview_data_fetched`] and hands it back on every
/// subsequent render.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewData {
    pub link: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<PreviewImage>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub url: String,
    pub width: f64,
    pub height: f64,
}

impl PreviewData {
    /// True when at least one of title, description or image url is present.
    pub fn has_data(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.image.is_some()
    }

    /// The empty value a fetch resolves to when nothing could be found.
    pub fn empty_for(link: Option<String>) -> Self {
        Self {
            link,
            ..Self::default()
        }
    }
}

impl PreviewImage {
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0.0 {
            None
        } else {
            Some(self.width / self.height)
        }
    }
}

/// Resolves preview metadata for a piece of message text.
///
/// Implementations absorb every failure: a text without a link, an
/// unreachable host or an unparsable page all resolve to an empty
/// [`PreviewData`].
#[async_trait]
pub trait PreviewFetcher: Send + Sync {
    async fn fetch_preview(
        &self,
        text: &str,
        cors_proxy: Option<&str>,
        user_agent: Option<&str>,
    ) -> PreviewData;
}
