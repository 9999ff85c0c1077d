//! Presentation selection and the render tree handed to the host.
//!
//! Nothing here holds state: [`select_presentation`] and [`render`] are pure
//! functions of their inputs, so a host may call them as often as it redraws.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::linkify::linkify;
use crate::options::{Color, DisplayOptions, ImageBuilder, Insets, PreviewProps, TextStyle};
use crate::{PreviewData, PreviewImage};

/// Side of the square image in the minimized layout.
pub const MINIMIZED_IMAGE_SIZE: f32 = 48.0;
const MINIMIZED_IMAGE_RADIUS: f32 = 12.0;
const TITLE_MAX_LINES: u32 = 2;
const DESCRIPTION_MAX_LINES: u32 = 3;
const CARD_TOP_GAP: f32 = 6.0;

/// Which card variant a preview is drawn with.
///
/// Each variant carries exactly what it renders; hidden images are already
/// stripped and tap targets already resolved against the options.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    NoPreview,
    /// Square image: text beside a small thumbnail.
    MinimizedCard {
        link: Option<String>,
        /// `None` when the preview has neither title nor description; the
        /// card then renders as an empty container even if it has an image.
        content: Option<MinimizedContent>,
    },
    /// Title, description and a full-width image stacked vertically.
    FullCard {
        link: Option<String>,
        title: Option<String>,
        description: Option<String>,
        image: Option<PreviewImage>,
        title_tap: bool,
        image_tap: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizedContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<PreviewImage>,
    pub title_tap: bool,
    pub image_tap: bool,
}

impl Presentation {
    pub fn is_card(&self) -> bool {
        !matches!(self, Presentation::NoPreview)
    }
}

pub fn select_presentation(data: Option<&PreviewData>, options: &DisplayOptions) -> Presentation {
    let Some(data) = data else {
        return Presentation::NoPreview;
    };

    let image = data.image.as_ref().filter(|_| !options.hide_image);
    if data.title.is_none() && data.description.is_none() && image.is_none() {
        return Presentation::NoPreview;
    }

    let square = data
        .image
        .as_ref()
        .and_then(PreviewImage::aspect_ratio)
        .is_some_and(|ratio| ratio == 1.0);

    if square {
        let content = (data.title.is_some() || data.description.is_some()).then(|| {
            MinimizedContent {
                title: data.title.clone(),
                description: data.description.clone(),
                image: image.cloned(),
                title_tap: options.open_on_preview_title_tap,
                image_tap: options.open_on_preview_image_tap,
            }
        });
        Presentation::MinimizedCard {
            link: data.link.clone(),
            content,
        }
    } else {
        Presentation::FullCard {
            link: data.link.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            image: image.cloned(),
            title_tap: options.open_on_preview_title_tap,
            image_tap: options.open_on_preview_image_tap,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub style: TextStyle,
    pub max_lines: Option<u32>,
    /// Link opened when the text is tapped.
    pub on_tap: Option<String>,
}

impl TextNode {
    fn plain(text: impl Into<String>, style: &TextStyle) -> Self {
        Self {
            text: text.into(),
            style: style.clone(),
            max_lines: None,
            on_tap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub url: String,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub on_tap: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Column { padding: Insets, children: Vec<Node> },
    Row { padding: Insets, children: Vec<Node> },
    /// A single paragraph made of differently styled runs.
    Paragraph(Vec<TextNode>),
    Text(TextNode),
    Image(ImageNode),
    /// Host-defined content, typically produced by a custom image builder.
    Custom { kind: String, data: serde_json::Value },
    /// Makes a node that has no tap target of its own open a link.
    Tap { on_tap: String, child: Box<Node> },
}

/// Vertical-expand state applied to the card container only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub animate: bool,
    /// Eased progress in `[0, 1]`.
    pub progress: f32,
}

impl Reveal {
    pub const SHOWN: Reveal = Reveal {
        animate: false,
        progress: 1.0,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    /// Sender bubbles are laid out from the trailing edge.
    pub is_sender: bool,
    pub background: Option<Color>,
    pub corner_radius: f32,
    pub padding: Insets,
    pub header: Option<TextNode>,
    /// The message text with links styled; always fully visible.
    pub text: Node,
    pub presentation: Presentation,
    /// `None` for [`Presentation::NoPreview`].
    pub card: Option<Node>,
    pub reveal: Reveal,
}

pub fn render(props: &PreviewProps, options: &DisplayOptions, reveal: Reveal) -> MessageView {
    let presentation = select_presentation(props.preview_data.as_ref(), options);
    let content_width = (props.width - options.padding.horizontal()).max(0.0);

    let header = options.header.as_ref().map(|header| {
        let mut node = TextNode::plain(header.clone(), &options.header_style);
        node.max_lines = Some(1);
        node
    });

    let card = match &presentation {
        Presentation::NoPreview => None,
        Presentation::MinimizedCard { link, content } => {
            Some(minimized_card(link.as_deref(), content.as_ref(), options))
        }
        Presentation::FullCard {
            link,
            title,
            description,
            image,
            title_tap,
            image_tap,
        } => {
            let mut children = text_column(
                title.as_deref(),
                description.as_deref(),
                link.as_deref().filter(|_| *title_tap),
                options,
            );
            if let Some(image) = image {
                let on_tap = link.clone().filter(|_| *image_tap);
                children.push(image_node(image, content_width, on_tap, options));
            }
            Some(Node::Column {
                padding: Insets {
                    top: CARD_TOP_GAP,
                    ..Insets::default()
                },
                children,
            })
        }
    };

    let reveal = if presentation.is_card() {
        reveal
    } else {
        Reveal::SHOWN
    };

    MessageView {
        is_sender: props.is_sender,
        background: options.background_color,
        corner_radius: options.corner_radius,
        padding: options.padding,
        header,
        text: linkified_text(&props.text, options),
        presentation,
        card,
        reveal,
    }
}

fn linkified_text(text: &str, options: &DisplayOptions) -> Node {
    let runs = linkify(text)
        .map(|span| match span.href() {
            Some(href) => TextNode {
                text: span.text.to_string(),
                style: options.link_style.clone(),
                max_lines: None,
                on_tap: Some(href),
            },
            None => TextNode::plain(span.text, &options.text_style),
        })
        .collect();
    Node::Paragraph(runs)
}

fn text_column(
    title: Option<&str>,
    description: Option<&str>,
    tap: Option<&str>,
    options: &DisplayOptions,
) -> Vec<Node> {
    let mut children = Vec::new();
    if let Some(title) = title {
        children.push(Node::Text(TextNode {
            text: title.to_string(),
            style: options.title_style.clone(),
            max_lines: Some(TITLE_MAX_LINES),
            on_tap: tap.map(String::from),
        }));
    }
    if let Some(description) = description {
        children.push(Node::Text(TextNode {
            text: description.to_string(),
            style: options.description_style.clone(),
            max_lines: Some(DESCRIPTION_MAX_LINES),
            on_tap: tap.map(String::from),
        }));
    }
    children
}

fn minimized_card(
    link: Option<&str>,
    content: Option<&MinimizedContent>,
    options: &DisplayOptions,
) -> Node {
    let padding = options.preview_container_padding;
    let Some(content) = content else {
        return Node::Column {
            padding,
            children: Vec::new(),
        };
    };

    let text = Node::Column {
        padding: Insets {
            right: 4.0,
            ..Insets::default()
        },
        children: text_column(
            content.title.as_deref(),
            content.description.as_deref(),
            link.filter(|_| content.title_tap),
            options,
        ),
    };
    let mut row = vec![text];
    if let Some(image) = &content.image {
        let on_tap = link.filter(|_| content.image_tap).map(String::from);
        row.push(match &options.image_builder {
            Some(builder) => built_image(builder, &image.url, on_tap),
            None => Node::Image(ImageNode {
                url: image.url.clone(),
                width: MINIMIZED_IMAGE_SIZE,
                height: MINIMIZED_IMAGE_SIZE,
                corner_radius: MINIMIZED_IMAGE_RADIUS,
                on_tap,
            }),
        });
    }

    Node::Column {
        padding,
        children: vec![Node::Row {
            padding: Insets::default(),
            children: row,
        }],
    }
}

fn image_node(
    image: &PreviewImage,
    width: f32,
    on_tap: Option<String>,
    options: &DisplayOptions,
) -> Node {
    if let Some(builder) = &options.image_builder {
        return built_image(builder, &image.url, on_tap);
    }
    // Height follows the aspect ratio but never exceeds the width.
    let height = match image.aspect_ratio() {
        Some(ratio) if ratio > 0.0 => (width / ratio as f32).min(width),
        _ => width,
    };
    Node::Image(ImageNode {
        url: image.url.clone(),
        width,
        height,
        corner_radius: 0.0,
        on_tap,
    })
}

fn built_image(builder: &ImageBuilder, url: &str, on_tap: Option<String>) -> Node {
    let node = builder(url);
    match on_tap {
        Some(on_tap) => Node::Tap {
            on_tap,
            child: Box::new(node),
        },
        None => node,
    }
}

/// Platform hook for opening links outside the message view.
#[async_trait]
pub trait UrlLauncher: Send + Sync {
    async fn can_open(&self, url: &Url) -> bool;
    /// Hands the URL to an external application.
    async fn open_external(&self, url: &Url);
}

/// Opens a tapped link.
///
/// A custom handler gets the raw string and full control. Otherwise the URL
/// is parsed and handed to the launcher if it says it can open it; anything
/// else is ignored.
pub async fn open_link(url: &str, options: &DisplayOptions) {
    if let Some(handler) = &options.on_link_pressed {
        handler(url);
        return;
    }

    let Ok(parsed) = Url::parse(url) else {
        debug!(url = %url, "Ignoring tap on unparsable link");
        return;
    };
    let Some(launcher) = &options.launcher else {
        return;
    };
    if launcher.can_open(&parsed).await {
        launcher.open_external(&parsed).await;
    } else {
        debug!(url = %url, "No handler can open link");
    }
}
