// src/consumer/host.rs
//
// The browser surface the consumer drives: tab queries, activation, reload,
// executor installation and per-tab messaging.

use crate::dispatch::{DeliveryError, ExecutorRequest, ExecutorStatus};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    /// Position in the current window, 0-based.
    pub index: usize,
    pub active: bool,
    pub url: String,
}

/// Internal browser pages never accept an executor.
pub fn is_scriptable_url(url: &str) -> bool {
    !(url.starts_with("chrome://") || url.starts_with("chrome-extension://"))
}

/// Lifecycle notifications pushed by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    NavigationComplete { tab_id: TabId, url: String },
    Removed { tab_id: TabId },
    Activated { tab_id: TabId, url: String },
}

impl TabEvent {
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::NavigationComplete { tab_id, .. }
            | Self::Removed { tab_id }
            | Self::Activated { tab_id, .. } => *tab_id,
        }
    }
}

pub trait TabHost: Send + Sync {
    /// Tabs of the current window, ordered by index.
    fn list_tabs(&self) -> impl Future<Output = Result<Vec<TabInfo>>> + Send;

    fn activate(&self, tab: TabId) -> impl Future<Output = Result<()>> + Send;

    fn reload(&self, tab: TabId) -> impl Future<Output = Result<()>> + Send;

    fn install_executor(&self, tab: TabId) -> impl Future<Output = Result<()>> + Send;

    fn send_to_tab(
        &self,
        tab: TabId,
        request: ExecutorRequest,
    ) -> impl Future<Output = std::result::Result<ExecutorStatus, DeliveryError>> + Send;

    /// Lifecycle events raised by the host's own calls (e.g. `activate`)
    /// since the last drain. Hosts that push events elsewhere return none.
    fn take_events(&self) -> Vec<TabEvent> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_pages_are_not_scriptable() {
        assert!(is_scriptable_url("https://example.com"));
        assert!(!is_scriptable_url("chrome://settings"));
        assert!(!is_scriptable_url("chrome-extension://abc/popup.html"));
    }

    #[test]
    fn test_event_tab_id() {
        let event = TabEvent::Activated {
            tab_id: 7,
            url: "https://a.test".into(),
        };
        assert_eq!(event.tab_id(), 7);
        assert_eq!(TabEvent::Removed { tab_id: 3 }.tab_id(), 3);
    }
}
