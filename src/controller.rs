//! The preview lifecycle controller.
//!
//! All controller state lives in one tokio task. Host updates, fetch
//! completions and animation ticks reach it as messages and are applied one
//! at a time, so the fetch and reveal state machines never see concurrent
//! mutation. Unmounting cancels the task's token: pending fetches are
//! abandoned without notifying and the ticker stops with the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::animation::{RevealAnimator, Transition};
use crate::coordinator::FetchCoordinator;
use crate::options::{DisplayOptions, PreviewProps};
use crate::utils::truncate_str;
use crate::view::{render, MessageView, Reveal};
use crate::{PreviewData, PreviewError, PreviewFetcher};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Snapshot of the controller's private state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub is_fetching: bool,
    pub should_animate: bool,
    pub progress: f32,
    pub fetches_started: u64,
}

/// What the host draws for one update.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub view: MessageView,
    pub state: ControllerState,
}

enum Command {
    Update {
        props: PreviewProps,
        reply: oneshot::Sender<RenderFrame>,
    },
    Frame {
        reply: oneshot::Sender<Option<RenderFrame>>,
    },
    State {
        reply: oneshot::Sender<ControllerState>,
    },
}

/// Handle to a mounted preview.
///
/// Must be created inside a tokio runtime. Dropping the handle unmounts.
pub struct PreviewController {
    commands: mpsc::UnboundedSender<Command>,
    progress: watch::Receiver<f32>,
    shutdown: CancellationToken,
}

impl PreviewController {
    pub fn mount(options: DisplayOptions, fetcher: Arc<dyn PreviewFetcher>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress) = watch::channel(0.0);
        let shutdown = CancellationToken::new();

        let animator = RevealAnimator::new(options.animation_duration);
        let task = ControllerTask {
            options,
            fetcher,
            coordinator: FetchCoordinator::new(),
            animator,
            last_props: None,
            shutdown: shutdown.clone(),
            resolved_tx,
            progress_tx,
        };
        tokio::spawn(task.run(command_rx, resolved_rx));
        debug!("Preview controller mounted");

        Self {
            commands,
            progress,
            shutdown,
        }
    }

    /// Applies a new render snapshot and returns what to draw.
    pub async fn update(&self, props: PreviewProps) -> Result<RenderFrame, PreviewError> {
        self.request(|reply| Command::Update { props, reply }).await
    }

    /// The frame for the latest snapshot at the current reveal progress,
    /// `None` before the first update.
    pub async fn frame(&self) -> Result<Option<RenderFrame>, PreviewError> {
        self.request(|reply| Command::Frame { reply }).await
    }

    pub async fn state(&self) -> Result<ControllerState, PreviewError> {
        self.request(|reply| Command::State { reply }).await
    }

    /// Reveal progress, updated on every animation tick. The channel closes
    /// on unmount.
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.progress.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Tears the controller down. Never waits for in-flight work.
    pub fn unmount(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Preview controller unmounted");
            self.shutdown.cancel();
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PreviewError> {
        if self.shutdown.is_cancelled() {
            return Err(PreviewError::Unmounted);
        }
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| PreviewError::Unmounted)?;
        rx.await.map_err(|_| PreviewError::Unmounted)
    }
}

impl Drop for PreviewController {
    fn drop(&mut self) {
        self.unmount();
    }
}

struct ControllerTask {
    options: DisplayOptions,
    fetcher: Arc<dyn PreviewFetcher>,
    coordinator: FetchCoordinator,
    animator: RevealAnimator,
    last_props: Option<PreviewProps>,
    shutdown: CancellationToken,
    resolved_tx: mpsc::UnboundedSender<PreviewData>,
    progress_tx: watch::Sender<f32>,
}

impl ControllerTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut resolved: mpsc::UnboundedReceiver<PreviewData>,
    ) {
        let mut ticker = interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(data) = resolved.recv() => self.on_fetch_resolved(data),
                command = commands.recv() => match command {
                    Some(Command::Update { props, reply }) => {
                        let frame = self.on_update(props, &mut ticker, &mut last_tick);
                        let _ = reply.send(frame);
                    }
                    Some(Command::Frame { reply }) => {
                        let _ = reply.send(self.current_frame());
                    }
                    Some(Command::State { reply }) => {
                        let _ = reply.send(self.state());
                    }
                    None => break,
                },
                now = ticker.tick(), if self.animator.is_running() => {
                    let progress = self.animator.advance(now - last_tick);
                    last_tick = now;
                    self.publish_progress(progress);
                }
            }
        }

        // Stragglers that were queued before teardown are dropped unread.
        resolved.close();
        debug!("Preview controller task stopped");
    }

    fn on_update(
        &mut self,
        props: PreviewProps,
        ticker: &mut Interval,
        last_tick: &mut Instant,
    ) -> RenderFrame {
        let has_data = props
            .preview_data
            .as_ref()
            .is_some_and(PreviewData::has_data);

        if self.animator.observe(has_data) == Transition::Started {
            debug!(text = %truncate_str(&props.text, 48), "Preview data arrived, starting reveal");
            ticker.reset();
            *last_tick = Instant::now();
        }
        self.publish_progress(self.animator.progress());

        if self
            .coordinator
            .should_fetch(&props.text, props.preview_data.as_ref())
        {
            self.start_fetch(props.text.clone());
        }

        let frame = self.frame_for(&props);
        self.last_props = Some(props);
        frame
    }

    #[instrument(level = "debug", skip(self, text))]
    fn start_fetch(&mut self, text: String) {
        if !self.coordinator.begin() {
            return;
        }
        debug!(text = %truncate_str(&text, 48), "Fetching preview data");

        let fetcher = Arc::clone(&self.fetcher);
        let cors_proxy = self.options.cors_proxy.clone();
        let user_agent = self.options.user_agent.clone();
        let delay = self.options.notify_delay();
        let resolved = self.resolved_tx.clone();
        let cancelled = self.shutdown.child_token();

        tokio::spawn(async move {
            let work = async {
                let data = fetcher
                    .fetch_preview(&text, cors_proxy.as_deref(), user_agent.as_deref())
                    .await;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                data
            };
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    debug!("Discarding preview fetch for unmounted controller");
                }
                data = work => {
                    let _ = resolved.send(data);
                }
            }
        });
    }

    fn on_fetch_resolved(&mut self, data: PreviewData) {
        if self.shutdown.is_cancelled() {
            return;
        }
        debug!(has_data = data.has_data(), "Notifying host of fetched preview");
        (self.options.on_preview_data_fetched)(data);
        self.coordinator.settle();
    }

    /// Watchers only wake when the value actually moves.
    fn publish_progress(&self, progress: f32) {
        self.progress_tx.send_if_modified(|current| {
            if *current == progress {
                false
            } else {
                *current = progress;
                true
            }
        });
    }

    fn state(&self) -> ControllerState {
        ControllerState {
            is_fetching: self.coordinator.is_fetching(),
            should_animate: self.animator.should_animate(),
            progress: self.animator.progress(),
            fetches_started: self.coordinator.started(),
        }
    }

    fn current_frame(&self) -> Option<RenderFrame> {
        self.last_props.as_ref().map(|props| self.frame_for(props))
    }

    fn frame_for(&self, props: &PreviewProps) -> RenderFrame {
        let state = self.state();
        let animate = self.options.enable_animation && state.should_animate;
        let reveal = Reveal {
            animate,
            progress: if animate { state.progress } else { 1.0 },
        };
        RenderFrame {
            view: render(props, &self.options, reveal),
            state,
        }
    }
}
