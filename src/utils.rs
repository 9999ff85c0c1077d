use unicode_width::UnicodeWidthChar;

use url::Url;

use crate::PreviewError;

/// Safely truncate a string, ensuring it is not truncated in the middle of multi-byte characters
///
/// The output's display width never exceeds `max_width`; an ellipsis is
/// appended when anything was cut.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Parses `raw` and accepts it only for the schemes a preview is fetched for.
pub fn parse_http_url(raw: &str) -> Result<Url, PreviewError> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PreviewError::InvalidUrlScheme(other.to_string())),
    }
}

/// Builds the address actually requested: the proxy, when present, is a
/// plain prefix in front of the target URL.
pub fn proxied(url: &str, cors_proxy: Option<&str>) -> String {
    match cors_proxy {
        Some(proxy) if !proxy.is_empty() => format!("{proxy}{url}"),
        _ => url.to_string(),
    }
}

/// Resolves a possibly relative resource reference against the page it came from.
pub fn resolve_against(base: &Url, reference: &str) -> Option<String> {
    base.join(reference.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Hello, world!", 10), "Hello, ...");
        assert_eq!(truncate_str("你好，世界！", 8), "你好...");
        assert_eq!(truncate_str("Hi!", 10), "Hi!");
    }

    #[test]
    fn only_http_schemes_are_accepted() {
        assert!(parse_http_url("https://example.com").is_ok());
        assert!(matches!(
            parse_http_url("ftp://example.com"),
            Err(PreviewError::InvalidUrlScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            parse_http_url("not a url"),
            Err(PreviewError::UrlParseError(_))
        ));
    }

    #[test]
    fn proxy_is_a_prefix() {
        assert_eq!(
            proxied("https://example.com", Some("https://proxy.test/")),
            "https://proxy.test/https://example.com"
        );
        assert_eq!(proxied("https://example.com", Some("")), "https://example.com");
        assert_eq!(proxied("https://example.com", None), "https://example.com");
    }

    #[test]
    fn relative_images_resolve_against_page() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        assert_eq!(
            resolve_against(&base, "/img/cover.png").as_deref(),
            Some("https://example.com/img/cover.png")
        );
        assert_eq!(
            resolve_against(&base, "https://cdn.test/a.png").as_deref(),
            Some("https://cdn.test/a.png")
        );
    }
}
