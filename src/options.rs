use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::view::{Node, UrlLauncher};
use crate::PreviewData;

/// Invoked with the resolved preview once per completed fetch.
pub type PreviewCallback = Arc<dyn Fn(PreviewData) + Send + Sync>;
/// Replaces the default image node; receives the image URL.
pub type ImageBuilder = Arc<dyn Fn(&str) -> Node + Send + Sync>;
/// Takes over navigation for every tapped link; receives the raw URL.
pub type LinkPressHandler = Arc<dyn Fn(&str) + Send + Sync>;

pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(300);

/// ARGB color, `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub color: Option<Color>,
    pub font_size: Option<f32>,
    pub font_weight: FontWeight,
    pub underline: bool,
}

impl TextStyle {
    pub fn bold() -> Self {
        Self {
            font_weight: FontWeight::Bold,
            ..Self::default()
        }
    }

    pub fn underlined() -> Self {
        Self {
            underline: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub fn all(v: f32) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            left: horizontal,
            top: vertical,
            right: horizontal,
            bottom: vertical,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

/// Per-render input snapshot supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewProps {
    pub text: String,
    pub preview_data: Option<PreviewData>,
    /// Width available to the message bubble, in logical units.
    pub width: f32,
    pub is_sender: bool,
}

impl PreviewProps {
    pub fn new(text: impl Into<String>, width: f32) -> Self {
        Self {
            text: text.into(),
            preview_data: None,
            width,
            is_sender: false,
        }
    }

    pub fn with_preview_data(mut self, data: Option<PreviewData>) -> Self {
        self.preview_data = data;
        self
    }

    pub fn with_sender(mut self, is_sender: bool) -> Self {
        self.is_sender = is_sender;
        self
    }
}

/// Everything about a preview that does not change from render to render.
///
/// Only the fetch callback is required; every other field has a default
/// and a matching `with_*` setter.
#[derive(Clone)]
pub struct DisplayOptions {
    pub on_preview_data_fetched: PreviewCallback,
    pub enable_animation: bool,
    /// Length of the reveal and of the delay before the fetch callback fires.
    pub animation_duration: Duration,
    pub cors_proxy: Option<String>,
    pub user_agent: Option<String>,
    pub hide_image: bool,
    pub open_on_preview_image_tap: bool,
    pub open_on_preview_title_tap: bool,
    pub corner_radius: f32,
    pub padding: Insets,
    pub preview_container_padding: Insets,
    pub background_color: Option<Color>,
    pub header: Option<String>,
    pub header_style: TextStyle,
    pub text_style: TextStyle,
    pub link_style: TextStyle,
    pub title_style: TextStyle,
    pub description_style: TextStyle,
    pub image_builder: Option<ImageBuilder>,
    pub on_link_pressed: Option<LinkPressHandler>,
    pub launcher: Option<Arc<dyn UrlLauncher>>,
}

impl DisplayOptions {
    pub fn new(on_preview_data_fetched: impl Fn(PreviewData) + Send + Sync + 'static) -> Self {
        Self {
            on_preview_data_fetched: Arc::new(on_preview_data_fetched),
            enable_animation: false,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            cors_proxy: None,
            user_agent: None,
            hide_image: false,
            open_on_preview_image_tap: false,
            open_on_preview_title_tap: false,
            corner_radius: 20.0,
            padding: Insets::symmetric(24.0, 16.0),
            preview_container_padding: Insets::all(16.0),
            background_color: None,
            header: None,
            header_style: TextStyle::default(),
            text_style: TextStyle::default(),
            link_style: TextStyle::underlined(),
            title_style: TextStyle::bold(),
            description_style: TextStyle::default(),
            image_builder: None,
            on_link_pressed: None,
            launcher: None,
        }
    }

    pub fn with_animation(mut self, enabled: bool, duration: Duration) -> Self {
        self.enable_animation = enabled;
        self.animation_duration = duration;
        self
    }

    pub fn with_cors_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.cors_proxy = Some(proxy.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_hide_image(mut self, hide_image: bool) -> Self {
        self.hide_image = hide_image;
        self
    }

    pub fn with_open_on_preview_image_tap(mut self, open: bool) -> Self {
        self.open_on_preview_image_tap = open;
        self
    }

    pub fn with_open_on_preview_title_tap(mut self, open: bool) -> Self {
        self.open_on_preview_title_tap = open;
        self
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_preview_container_padding(mut self, padding: Insets) -> Self {
        self.preview_container_padding = padding;
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_header(mut self, header: impl Into<String>, style: TextStyle) -> Self {
        self.header = Some(header.into());
        self.header_style = style;
        self
    }

    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = style;
        self
    }

    pub fn with_link_style(mut self, style: TextStyle) -> Self {
        self.link_style = style;
        self
    }

    pub fn with_title_style(mut self, style: TextStyle) -> Self {
        self.title_style = style;
        self
    }

    pub fn with_description_style(mut self, style: TextStyle) -> Self {
        self.description_style = style;
        self
    }

    pub fn with_image_builder(
        mut self,
        builder: impl Fn(&str) -> Node + Send + Sync + 'static,
    ) -> Self {
        self.image_builder = Some(Arc::new(builder));
        self
    }

    pub fn with_link_press_handler(
        mut self,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_link_pressed = Some(Arc::new(handler));
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn UrlLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Delay between a fetch resolving and the host being notified.
    pub(crate) fn notify_delay(&self) -> Duration {
        self.animation_duration
    }
}

impl fmt::Debug for DisplayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayOptions")
            .field("enable_animation", &self.enable_animation)
            .field("animation_duration", &self.animation_duration)
            .field("cors_proxy", &self.cors_proxy)
            .field("user_agent", &self.user_agent)
            .field("hide_image", &self.hide_image)
            .field("open_on_preview_image_tap", &self.open_on_preview_image_tap)
            .field("open_on_preview_title_tap", &self.open_on_preview_title_tap)
            .field("header", &self.header)
            .field("image_builder", &self.image_builder.is_some())
            .field("on_link_pressed", &self.on_link_pressed.is_some())
            .field("launcher", &self.launcher.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = DisplayOptions::new(|_| {});
        assert!(!options.enable_animation);
        assert_eq!(options.animation_duration, Duration::from_millis(300));
        assert!(!options.hide_image);
        assert!(!options.open_on_preview_image_tap);
        assert!(!options.open_on_preview_title_tap);
        assert!(options.cors_proxy.is_none());
        assert!(options.link_style.underline);
        assert_eq!(options.padding, Insets::symmetric(24.0, 16.0));
    }

    #[test]
    fn builders_chain() {
        let options = DisplayOptions::new(|_| {})
            .with_animation(true, Duration::ZERO)
            .with_cors_proxy("https://proxy.test/")
            .with_user_agent("agent/1.0")
            .with_hide_image(true);
        assert!(options.enable_animation);
        assert_eq!(options.notify_delay(), Duration::ZERO);
        assert_eq!(options.cors_proxy.as_deref(), Some("https://proxy.test/"));
        assert_eq!(options.user_agent.as_deref(), Some("agent/1.0"));
        assert!(options.hide_image);
    }
}
