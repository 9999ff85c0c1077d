//! Link-span detection in message text.
//!
//! Splits text into plain, URL and email spans without allocating: spans
//! borrow from the input and are produced lazily.

use regex::Regex;
use std::sync::LazyLock;

#[rustfmt::skip]
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?xi)
        (?P<url>(?:https?://|www\.)[^\s<>"']+)
        |
        (?P<email>[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,})
    "#).unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ':', ';', ')', ']'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Text,
    Url,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpan<'a> {
    pub kind: SpanKind,
    pub text: &'a str,
}

impl LinkSpan<'_> {
    /// The target a tap on this span opens, `None` for plain text.
    pub fn href(&self) -> Option<String> {
        match self.kind {
            SpanKind::Text => None,
            SpanKind::Url if self.text.len() >= 4 && self.text[..4].eq_ignore_ascii_case("www.") => {
                Some(format!("https://{}", self.text))
            }
            SpanKind::Url => Some(self.text.to_string()),
            SpanKind::Email => Some(format!("mailto:{}", self.text)),
        }
    }
}

/// Lazy iterator returned by [`linkify`].
pub struct Spans<'a> {
    text: &'a str,
    pos: usize,
    pending: Option<LinkSpan<'a>>,
}

pub fn linkify(text: &str) -> Spans<'_> {
    Spans {
        text,
        pos: 0,
        pending: None,
    }
}

/// The href of the first URL in `text`; emails are ignored.
pub fn first_url(text: &str) -> Option<String> {
    linkify(text)
        .find(|span| span.kind == SpanKind::Url)
        .and_then(|span| span.href())
}

impl<'a> Iterator for Spans<'a> {
    type Item = LinkSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(span) = self.pending.take() {
            return Some(span);
        }
        if self.pos >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.pos..];
        let Some(caps) = LINK_RE.captures(rest) else {
            self.pos = self.text.len();
            return Some(LinkSpan {
                kind: SpanKind::Text,
                text: rest,
            });
        };

        let (m, kind) = match (caps.name("url"), caps.name("email")) {
            (Some(m), _) => (m, SpanKind::Url),
            (None, Some(m)) => (m, SpanKind::Email),
            (None, None) => unreachable!("one alternative always participates"),
        };

        let matched = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        let start = self.pos + m.start();
        let end = start + matched.len();

        // A bare "www." or "https://" trimmed down to nothing stays text.
        if matched.is_empty() || matched.ends_with("://") || matched.eq_ignore_ascii_case("www") {
            let end = self.pos + m.end();
            let span = LinkSpan {
                kind: SpanKind::Text,
                text: &self.text[self.pos..end],
            };
            self.pos = end;
            return Some(span);
        }

        let link = LinkSpan {
            kind,
            text: &self.text[start..end],
        };
        let leading = &self.text[self.pos..start];
        self.pos = end;

        if leading.is_empty() {
            Some(link)
        } else {
            self.pending = Some(link);
            Some(LinkSpan {
                kind: SpanKind::Text,
                text: leading,
            })
        }
    }
}
