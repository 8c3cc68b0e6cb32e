// src/consumer/executor.rs
//
// Page-side half of the consumer: the code installed into a tab. It only
// knows how to scroll.

use crate::dispatch::{DeliveryError, ExecutorRequest, ExecutorStatus, ScrollDirection};
use crate::types::{ScrollBehavior, ScrollConfig};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub scroll_y: i64,
    pub max_scroll: i64,
}

impl PageState {
    pub fn new(max_scroll: i64) -> Self {
        Self {
            scroll_y: 0,
            max_scroll: max_scroll.max(0),
        }
    }

    fn scroll_by(&mut self, delta: i64) {
        self.scroll_y = (self.scroll_y + delta).clamp(0, self.max_scroll);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollExecutor {
    distance: i64,
    behavior: ScrollBehavior,
}

impl ScrollExecutor {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            distance: config.distance,
            behavior: config.behavior,
        }
    }

    pub fn distance(&self) -> i64 {
        self.distance
    }

    pub fn handle(&self, page: &mut PageState, request: ExecutorRequest) -> ExecutorStatus {
        let delta = match request.action {
            ScrollDirection::ScrollUp => -self.distance,
            ScrollDirection::ScrollDown => self.distance,
        };
        page.scroll_by(delta);
        debug!(
            "Scrolled {} px ({}), now at {}",
            delta,
            self.behavior.as_str(),
            page.scroll_y
        );
        ExecutorStatus {
            ok: true,
            scroll_y: page.scroll_y,
        }
    }

    /// Entry point for raw messages arriving at the page.
    pub fn handle_json(
        &self,
        page: &mut PageState,
        raw: &str,
    ) -> Result<ExecutorStatus, DeliveryError> {
        let request: ExecutorRequest = serde_json::from_str(raw)
            .map_err(|e| DeliveryError::Rejected(format!("unknown executor message: {}", e)))?;
        Ok(self.handle(page, request))
    }
}
