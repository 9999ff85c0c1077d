use crate::utils;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Metadata found in a page, before image dimensions are known for sure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Dimensions the page declares for its image, if any.
    pub image_size: Option<(f64, f64)>,
}

/// Metadata extractor, responsible for extracting preview information from webpage content
#[derive(Clone, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, html: &str, page_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);

        let title = first_content(
            &document,
            &["meta[property='og:title']", "meta[name='twitter:title']"],
        )
        .or_else(|| self.extract_title_element(&document));

        let description = first_content(
            &document,
            &[
                "meta[property='og:description']",
                "meta[name='twitter:description']",
                "meta[name='description']",
            ],
        );

        let image_url = first_content(
            &document,
            &[
                "meta[property='og:image']",
                "meta[property='og:image:url']",
                "meta[name='twitter:image']",
                "meta[itemprop='image']",
            ],
        )
        .and_then(|raw| utils::resolve_against(page_url, &raw));

        let image_size = image_url.as_ref().and_then(|_| {
            let width = first_content(&document, &["meta[property='og:image:width']"])?;
            let height = first_content(&document, &["meta[property='og:image:height']"])?;
            let (width, height) = (width.parse::<f64>().ok()?, height.parse::<f64>().ok()?);
            (width > 0.0 && height > 0.0).then_some((width, height))
        });

        debug!(
            title = ?title,
            description = ?description,
            image = ?image_url,
            "Extracted page metadata"
        );

        ExtractedPage {
            title,
            description,
            image_url,
            image_size,
        }
    }

    fn extract_title_element(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(non_blank)
    }
}

fn first_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        document
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
            .and_then(|s| non_blank(s.to_string()))
    })
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/posts/1").unwrap()
    }

    #[test]
    fn open_graph_wins_over_fallbacks() {
        let html = r#"<html><head>
            <title>Plain title</title>
            <meta property="og:title" content=" OG title ">
            <meta name="description" content="plain description">
            <meta property="og:description" content="og description">
            <meta property="og:image" content="/cover.png">
            <meta property="og:image:width" content="1200">
            <meta property="og:image:height" content="630">
        </head></html>"#;

        let page = MetadataExtractor::new().extract(html, &page());
        assert_eq!(page.title.as_deref(), Some("OG title"));
        assert_eq!(page.description.as_deref(), Some("og description"));
        assert_eq!(page.image_url.as_deref(), Some("https://example.com/cover.png"));
        assert_eq!(page.image_size, Some((1200.0, 630.0)));
    }

    #[test]
    fn falls_back_to_title_and_meta_description() {
        let html = r#"<html><head>
            <title>
                Plain title
            </title>
            <meta name="description" content="plain description">
            <meta name="twitter:image" content="https://cdn.test/a.jpg">
        </head></html>"#;

        let page = MetadataExtractor::new().extract(html, &page());
        assert_eq!(page.title.as_deref(), Some("Plain title"));
        assert_eq!(page.description.as_deref(), Some("plain description"));
        assert_eq!(page.image_url.as_deref(), Some("https://cdn.test/a.jpg"));
        assert_eq!(page.image_size, None);
    }

    #[test]
    fn empty_page_yields_nothing() {
        let page = MetadataExtractor::new().extract("<html><head><title> </title></head></html>", &page());
        assert_eq!(page, ExtractedPage::default());
    }
}
