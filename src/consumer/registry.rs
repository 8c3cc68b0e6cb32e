// src/consumer/registry.rs

use super::host::TabId;
use std::collections::HashSet;
use tracing::debug;

/// Tabs known to carry an installed executor.
///
/// Owned by the consumer task; an entry is only ever a hint, so a failed
/// delivery clears it and the next action reinstalls.
#[derive(Debug, Default)]
pub struct InjectionRegistry {
    installed: HashSet<TabId>,
}

impl InjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self, tab: TabId) -> bool {
        self.installed.contains(&tab)
    }

    pub fn mark_installed(&mut self, tab: TabId) {
        self.installed.insert(tab);
    }

    /// Returns true if an entry was removed.
    pub fn invalidate(&mut self, tab: TabId) -> bool {
        let removed = self.installed.remove(&tab);
        if removed {
            debug!("Injection entry cleared for tab {}", tab);
        }
        removed
    }

    pub fn reset(&mut self) {
        debug!("Injection registry reset ({} entries)", self.installed.len());
        self.installed.clear();
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}
