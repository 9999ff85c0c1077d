use criterion::{black_box, criterion_group, criterion_main, Criterion};
use link_previewer::{
    linkify, render, select_presentation, DisplayOptions, PreviewData, PreviewImage, PreviewProps,
    Reveal,
};
use std::time::Duration;

const MESSAGE: &str = "Release notes are up at https://blog.rust-lang.org/2024/11/28/Rust-1.83.0.html \
    and the tracking issue lives on www.github.com/rust-lang/rust, ping me@rust-lang.org with questions.";

fn preview() -> PreviewData {
    PreviewData {
        link: Some("https://blog.rust-lang.org/2024/11/28/Rust-1.83.0.html".into()),
        title: Some("Announcing Rust 1.83.0".into()),
        description: Some("The Rust team is happy to announce a new version of Rust.".into()),
        image: Some(PreviewImage {
            url: "https://www.rust-lang.org/static/images/rust-social-wide.jpg".into(),
            width: 1200.0,
            height: 630.0,
        }),
    }
}

fn bench_presentation(c: &mut Criterion) {
    let options = DisplayOptions::new(|_| {});
    let data = preview();
    let props = PreviewProps::new(MESSAGE, 360.0).with_preview_data(Some(data.clone()));

    let mut group = c.benchmark_group("presentation");
    group
        .sample_size(100)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    group.bench_function("select_presentation", |b| {
        b.iter(|| black_box(select_presentation(Some(black_box(&data)), &options)))
    });

    group.bench_function("linkify", |b| {
        b.iter(|| black_box(linkify(black_box(MESSAGE)).count()))
    });

    group.bench_function("render_full_card", |b| {
        b.iter(|| black_box(render(black_box(&props), &options, Reveal::SHOWN)))
    });

    group.finish();
}

criterion_group!(benches, bench_presentation);
criterion_main!(benches);
