#[cfg(feature = "cache")]
use crate::Cache;
use crate::fetcher::FetchResult;
use crate::linkify::first_url;
use crate::utils::{parse_http_url, proxied};
use crate::{
    Fetcher, MetadataExtractor, PreviewData, PreviewError, PreviewFetcher, PreviewImage,
};
use async_trait::async_trait;
use std::io::Cursor;
use tracing::{debug, instrument};

/// Default [`PreviewFetcher`]: finds the first URL in the text and reads
/// its page metadata over HTTP.
#[derive(Clone, Default)]
pub struct LinkPreviewGenerator {
    pub fetcher: Fetcher,
    extractor: MetadataExtractor,
    #[cfg(feature = "cache")]
    cache: Option<Cache>,
}

impl LinkPreviewGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            ..Self::default()
        }
    }

    /// Remembers up to `capacity` resolved previews.
    #[cfg(feature = "cache")]
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(Cache::new(capacity));
        self
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn generate(
        &self,
        url: &str,
        cors_proxy: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<PreviewData, PreviewError> {
        let page = parse_http_url(url)?;
        let target = proxied(page.as_str(), cors_proxy);

        match self.fetcher.fetch(&target, user_agent).await? {
            FetchResult::Image(bytes) => {
                let (width, height) = image_size(&bytes)?;
                Ok(PreviewData {
                    link: Some(url.to_string()),
                    image: Some(PreviewImage {
                        url: url.to_string(),
                        width,
                        height,
                    }),
                    ..PreviewData::default()
                })
            }
            FetchResult::Html(html) => {
                let extracted = self.extractor.extract(&html, &page);
                let image = match extracted.image_url {
                    Some(image_url) => {
                        self.resolve_image(image_url, extracted.image_size, cors_proxy, user_agent)
                            .await
                    }
                    None => None,
                };
                Ok(PreviewData {
                    link: Some(url.to_string()),
                    title: extracted.title,
                    description: extracted.description,
                    image,
                })
            }
        }
    }

    /// Uses declared dimensions when the page has them, otherwise probes the
    /// image. An image of unknown size is left out.
    async fn resolve_image(
        &self,
        url: String,
        declared: Option<(f64, f64)>,
        cors_proxy: Option<&str>,
        user_agent: Option<&str>,
    ) -> Option<PreviewImage> {
        if let Some((width, height)) = declared {
            return Some(PreviewImage { url, width, height });
        }

        let probed = self
            .fetcher
            .fetch_image_head(&proxied(&url, cors_proxy), user_agent)
            .await
            .and_then(|bytes| image_size(&bytes));
        match probed {
            Ok((width, height)) => Some(PreviewImage { url, width, height }),
            Err(e) => {
                e.log();
                None
            }
        }
    }
}

#[async_trait]
impl PreviewFetcher for LinkPreviewGenerator {
    async fn fetch_preview(
        &self,
        text: &str,
        cors_proxy: Option<&str>,
        user_agent: Option<&str>,
    ) -> PreviewData {
        let Some(url) = first_url(text) else {
            debug!("No link in text, nothing to fetch");
            return PreviewData::default();
        };

        #[cfg(feature = "cache")]
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&url)) {
            debug!(url = %url, "Preview served from cache");
            return cached;
        }

        match self.generate(&url, cors_proxy, user_agent).await {
            Ok(data) => {
                #[cfg(feature = "cache")]
                if let Some(cache) = &self.cache {
                    cache.set(url.clone(), data.clone());
                }
                data
            }
            Err(e) => {
                e.log();
                PreviewData::empty_for(Some(url))
            }
        }
    }
}

fn image_size(bytes: &[u8]) -> Result<(f64, f64), PreviewError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreviewError::ImageError(e.to_string()))?
        .into_dimensions()
        .map_err(|e| PreviewError::ImageError(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(PreviewError::ImageError("image has no area".into()));
    }
    Ok((f64::from(width), f64::from(height)))
}
