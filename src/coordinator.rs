use crate::linkify::first_url;
use crate::PreviewData;

/// Tracks the single outstanding fetch of a controller.
///
/// Checking and setting happen in the same update turn, so no lock is needed.
#[derive(Debug, Default, Clone)]
pub struct FetchCoordinator {
    is_fetching: bool,
    started: u64,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    /// Number of fetches started over the controller's lifetime.
    pub fn started(&self) -> u64 {
        self.started
    }

    /// A fetch is due when the text holds a link, the host has no data for
    /// it yet and no fetch is in flight.
    ///
    /// A text change while a fetch is pending does not trigger another one.
    pub fn should_fetch(&self, text: &str, data: Option<&PreviewData>) -> bool {
        data.is_none() && !self.is_fetching && first_url(text).is_some()
    }

    /// Marks a fetch as in flight. Returns false if one already was.
    pub fn begin(&mut self) -> bool {
        if self.is_fetching {
            return false;
        }
        self.is_fetching = true;
        self.started += 1;
        true
    }

    /// Called after the host has been notified.
    pub fn settle(&mut self) {
        self.is_fetching = false;
    }
}
