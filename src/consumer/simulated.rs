// src/consumer/simulated.rs
//
// In-memory browser window. Stands in for the real tab host in tests and in
// the demo binary; executors run the real ScrollExecutor against a fake page.

use super::executor::{PageState, ScrollExecutor};
use super::host::{is_scriptable_url, TabEvent, TabHost, TabId, TabInfo};
use crate::dispatch::{DeliveryError, ExecutorRequest, ExecutorStatus};
use anyhow::{bail, Result};
use std::sync::{Arc, Mutex, MutexGuard};

const PAGE_HEIGHT: i64 = 5000;

#[derive(Debug)]
struct SimTab {
    id: TabId,
    url: String,
    executor_installed: bool,
    page: PageState,
    reloads: u32,
}

#[derive(Debug)]
struct BrowserState {
    tabs: Vec<SimTab>,
    active: Option<TabId>,
    next_id: TabId,
    install_calls: u64,
    fail_installs: bool,
    executor: ScrollExecutor,
    events: Vec<TabEvent>,
}

impl BrowserState {
    fn tab_mut(&mut self, id: TabId) -> Option<&mut SimTab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    fn tab(&self, id: TabId) -> Option<&SimTab> {
        self.tabs.iter().find(|t| t.id == id)
    }
}

/// Clones share the same window.
#[derive(Debug, Clone)]
pub struct SimulatedBrowser {
    state: Arc<Mutex<BrowserState>>,
}

impl SimulatedBrowser {
    pub fn new(executor: ScrollExecutor) -> Self {
        Self {
            state: Arc::new(Mutex::new(BrowserState {
                tabs: Vec::new(),
                active: None,
                next_id: 1,
                install_calls: 0,
                fail_installs: false,
                executor,
                events: Vec::new(),
            })),
        }
    }

    /// Opens one tab per URL; the first becomes active.
    pub fn with_urls(executor: ScrollExecutor, urls: &[&str]) -> Self {
        let browser = Self::new(executor);
        for url in urls {
            browser.open_tab(url);
        }
        browser
    }

    fn lock(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open_tab(&self, url: &str) -> TabId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.tabs.push(SimTab {
            id,
            url: url.to_string(),
            executor_installed: false,
            page: PageState::new(PAGE_HEIGHT),
            reloads: 0,
        });
        if state.active.is_none() {
            state.active = Some(id);
        }
        id
    }

    /// Loads a new document: the old executor is gone.
    pub fn navigate(&self, tab: TabId, url: &str) -> Option<TabEvent> {
        let mut state = self.lock();
        let sim = state.tab_mut(tab)?;
        sim.url = url.to_string();
        sim.executor_installed = false;
        sim.page = PageState::new(PAGE_HEIGHT);
        Some(TabEvent::NavigationComplete {
            tab_id: tab,
            url: url.to_string(),
        })
    }

    pub fn close_tab(&self, tab: TabId) -> Option<TabEvent> {
        let mut state = self.lock();
        let position = state.tabs.iter().position(|t| t.id == tab)?;
        state.tabs.remove(position);
        if state.active == Some(tab) {
            let next = position.min(state.tabs.len().saturating_sub(1));
            state.active = state.tabs.get(next).map(|t| t.id);
        }
        Some(TabEvent::Removed { tab_id: tab })
    }

    pub fn set_active(&self, tab: TabId) -> Option<TabEvent> {
        let mut state = self.lock();
        let url = state.tab(tab)?.url.clone();
        state.active = Some(tab);
        Some(TabEvent::Activated { tab_id: tab, url })
    }

    pub fn fail_installs(&self, fail: bool) {
        self.lock().fail_installs = fail;
    }

    /// Drops a tab's executor without telling anyone.
    pub fn drop_executor(&self, tab: TabId) {
        if let Some(sim) = self.lock().tab_mut(tab) {
            sim.executor_installed = false;
        }
    }

    pub fn install_count(&self) -> u64 {
        self.lock().install_calls
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.lock().active
    }

    pub fn scroll_y(&self, tab: TabId) -> Option<i64> {
        self.lock().tab(tab).map(|t| t.page.scroll_y)
    }

    pub fn reload_count(&self, tab: TabId) -> u32 {
        self.lock().tab(tab).map_or(0, |t| t.reloads)
    }

    pub fn has_executor(&self, tab: TabId) -> bool {
        self.lock().tab(tab).is_some_and(|t| t.executor_installed)
    }

    pub fn snapshot(&self) -> Vec<TabInfo> {
        let state = self.lock();
        state
            .tabs
            .iter()
            .enumerate()
            .map(|(index, t)| TabInfo {
                id: t.id,
                index,
                active: state.active == Some(t.id),
                url: t.url.clone(),
            })
            .collect()
    }
}

impl TabHost for SimulatedBrowser {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self.snapshot())
    }

    async fn activate(&self, tab: TabId) -> Result<()> {
        let Some(event) = self.set_active(tab) else {
            bail!("no tab with id {}", tab);
        };
        self.lock().events.push(event);
        Ok(())
    }

    async fn reload(&self, tab: TabId) -> Result<()> {
        let mut state = self.lock();
        let Some(sim) = state.tab_mut(tab) else {
            bail!("no tab with id {}", tab);
        };
        sim.reloads += 1;
        sim.executor_installed = false;
        sim.page = PageState::new(PAGE_HEIGHT);
        Ok(())
    }

    async fn install_executor(&self, tab: TabId) -> Result<()> {
        let mut state = self.lock();
        state.install_calls += 1;
        let fail = state.fail_installs;
        let Some(sim) = state.tab_mut(tab) else {
            bail!("no tab with id {}", tab);
        };
        if fail {
            bail!("cannot access contents of tab {}", tab);
        }
        if !is_scriptable_url(&sim.url) {
            bail!("cannot script {}", sim.url);
        }
        sim.executor_installed = true;
        Ok(())
    }

    async fn send_to_tab(
        &self,
        tab: TabId,
        request: ExecutorRequest,
    ) -> std::result::Result<ExecutorStatus, DeliveryError> {
        let raw = serde_json::to_string(&request)
            .map_err(|e| DeliveryError::Rejected(e.to_string()))?;

        let mut state = self.lock();
        let executor = state.executor;
        let sim = state.tab_mut(tab).ok_or(DeliveryError::Unreachable)?;
        if !sim.executor_installed {
            return Err(DeliveryError::ExecutorMissing);
        }
        executor.handle_json(&mut sim.page, &raw)
    }

    fn take_events(&self) -> Vec<TabEvent> {
        std::mem::take(&mut self.lock().events)
    }
}
