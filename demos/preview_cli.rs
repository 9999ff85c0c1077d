use clap::Parser;
use colored::Colorize;
use link_previewer::{
    DisplayOptions, LinkPreviewGenerator, Node, PreviewController, PreviewProps, Presentation,
    RenderFrame,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Mounts a preview controller for a message and prints each frame it renders.
#[derive(Parser)]
struct Args {
    /// Message text, e.g. "look at https://www.rust-lang.org"
    text: String,
    #[arg(long)]
    cors_proxy: Option<String>,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(long)]
    hide_image: bool,
    /// Reveal duration in milliseconds; 0 disables the animation.
    #[arg(long, default_value_t = 300)]
    duration_ms: u64,
    #[arg(long, default_value_t = 360.0)]
    width: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    #[cfg(feature = "logging")]
    link_previewer::setup_logging(link_previewer::LogConfig::default())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let duration = Duration::from_millis(args.duration_ms);
    let mut options = DisplayOptions::new(move |data| {
        let _ = tx.send(data);
    })
    .with_animation(!duration.is_zero(), duration)
    .with_hide_image(args.hide_image);
    if let Some(proxy) = args.cors_proxy {
        options = options.with_cors_proxy(proxy);
    }
    if let Some(user_agent) = args.user_agent {
        options = options.with_user_agent(user_agent);
    }

    let controller = PreviewController::mount(options, Arc::new(LinkPreviewGenerator::new()));
    let props = PreviewProps::new(args.text, args.width);

    let frame = controller.update(props.clone()).await?;
    print_frame("initial", &frame);
    if !frame.state.is_fetching {
        println!("{}", "No link found, nothing to preview.".yellow());
        return Ok(());
    }

    let Some(data) = rx.recv().await else {
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&data)?.dimmed());

    #[cfg(feature = "logging")]
    link_previewer::log_preview_card(&data);

    let frame = controller
        .update(props.with_preview_data(Some(data)))
        .await?;
    print_frame("data arrived", &frame);

    let mut progress = controller.progress();
    while *progress.borrow_and_update() < 1.0 {
        if progress.changed().await.is_err() {
            break;
        }
    }
    if let Some(frame) = controller.frame().await? {
        print_frame("revealed", &frame);
    }

    controller.unmount();
    Ok(())
}

fn print_frame(label: &str, frame: &RenderFrame) {
    let variant = match &frame.view.presentation {
        Presentation::NoPreview => "no preview",
        Presentation::MinimizedCard { .. } => "minimized card",
        Presentation::FullCard { .. } => "full card",
    };
    println!(
        "{} {} fetching={} animate={} progress={:.2}",
        format!("[{label}]").bold().blue(),
        variant.green(),
        frame.state.is_fetching,
        frame.view.reveal.animate,
        frame.view.reveal.progress,
    );
    if let Some(card) = &frame.view.card {
        print_node(card, 1);
    }
}

fn print_node(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Column { children, .. } | Node::Row { children, .. } => {
            children.iter().for_each(|child| print_node(child, depth + 1));
        }
        Node::Text(text) => println!("{indent}{}", text.text),
        Node::Paragraph(runs) => {
            let line: String = runs.iter().map(|run| run.text.as_str()).collect();
            println!("{indent}{line}");
        }
        Node::Image(image) => println!(
            "{indent}{} {} ({}x{})",
            "image".cyan(),
            image.url,
            image.width,
            image.height
        ),
        Node::Custom { kind, .. } => println!("{indent}<{kind}>"),
        Node::Tap { on_tap, child } => {
            println!("{indent}{} {on_tap}", "tap".cyan());
            print_node(child, depth + 1);
        }
    }
}
