// src/consumer/controller.rs
//
// Consumer context. One task owns the injection registry and the tab host and
// handles every inbound event in arrival order.

use super::host::{is_scriptable_url, TabEvent, TabHost, TabId, TabInfo};
use super::registry::InjectionRegistry;
use crate::confirmation::Action;
use crate::dispatch::{ConsumerEvent, ExecutorRequest, InboundMessage, Reply, ScrollDirection};
use crate::pipeline::PipelineMetrics;
use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStep {
    Previous,
    Next,
}

/// Neighbour of `index` among `len` tabs, wrapping at both ends.
pub fn neighbor_index(index: usize, len: usize, step: TabStep) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let index = index.min(len - 1);
    Some(match step {
        TabStep::Previous => {
            if index == 0 {
                len - 1
            } else {
                index - 1
            }
        }
        TabStep::Next => {
            if index == len - 1 {
                0
            } else {
                index + 1
            }
        }
    })
}

pub struct BackgroundController<H: TabHost> {
    host: H,
    registry: InjectionRegistry,
    metrics: PipelineMetrics,
}

impl<H: TabHost> BackgroundController<H> {
    pub fn new(host: H, metrics: PipelineMetrics) -> Self {
        Self {
            host,
            registry: InjectionRegistry::new(),
            metrics,
        }
    }

    pub fn registry(&self) -> &InjectionRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Serve the inbox until every sender is gone.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<ConsumerEvent>) -> Self {
        info!("🧭 Consumer listening for gestures");
        while let Some(event) = inbox.recv().await {
            self.handle_event(event).await;
        }
        info!("Consumer inbox closed");
        self
    }

    /// Handle one inbox event, then any tab events the host raised while
    /// handling it.
    pub async fn handle_event(&mut self, event: ConsumerEvent) {
        match event {
            ConsumerEvent::Message { message, reply } => {
                let answer = self.handle_message(message).await;
                if reply.send(answer).is_err() {
                    debug!("Sender stopped waiting for reply");
                }
            }
            ConsumerEvent::Tab(tab_event) => self.handle_tab_event(tab_event).await,
            ConsumerEvent::Reinitialized => {
                info!("🔄 Extension reinitialized, clearing injection registry");
                self.registry.reset();
            }
        }

        for tab_event in self.host.take_events() {
            self.handle_tab_event(tab_event).await;
        }
    }

    pub async fn handle_message(&mut self, message: InboundMessage) -> Reply {
        match message {
            InboundMessage::Gesture { gesture } => self.perform(gesture).await,
            InboundMessage::Command { command } => match Action::from_command(&command) {
                Some(action) => {
                    info!("⌨️  Command {} → {}", command, action);
                    self.perform(action).await
                }
                None => {
                    warn!("Unknown command: {}", command);
                    Reply::failed(format!("unknown command {}", command))
                }
            },
        }
    }

    pub async fn perform(&mut self, action: Action) -> Reply {
        debug!("Handling action {}", action);
        let result = match action {
            Action::ScrollUp => self.scroll(ScrollDirection::ScrollUp).await,
            Action::ScrollDown => self.scroll(ScrollDirection::ScrollDown).await,
            Action::Left => self.switch_tab(TabStep::Previous).await,
            Action::Right => self.switch_tab(TabStep::Next).await,
            Action::Stop => self.reload_active().await,
        };

        match result {
            Ok(detail) => {
                info!("✅ {} done ({})", action, detail);
                Reply::ok_with(detail)
            }
            Err(e) => {
                warn!("⚠️  {} dropped: {:#}", action, e);
                Reply::failed(format!("{:#}", e))
            }
        }
    }

    pub async fn handle_tab_event(&mut self, event: TabEvent) {
        match event {
            TabEvent::NavigationComplete { tab_id, url } => {
                debug!("Tab {} navigated to {}", tab_id, url);
                self.registry.invalidate(tab_id);
            }
            TabEvent::Removed { tab_id } => {
                debug!("Tab {} closed", tab_id);
                self.registry.invalidate(tab_id);
            }
            TabEvent::Activated { tab_id, url } => {
                if !is_scriptable_url(&url) {
                    debug!("Tab {} ({}) cannot host an executor", tab_id, url);
                    return;
                }
                if self.registry.is_installed(tab_id) {
                    return;
                }
                // Eager install; a failure here only means the next scroll retries.
                if let Err(e) = self.install(tab_id).await {
                    debug!("Pre-install on activation failed: {:#}", e);
                }
            }
        }
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    async fn scroll(&mut self, direction: ScrollDirection) -> Result<String> {
        let tab = self.active_tab().await?;

        if !self.registry.is_installed(tab.id) {
            self.install(tab.id)
                .await
                .context("executor installation failed")?;
        }

        match self
            .host
            .send_to_tab(tab.id, ExecutorRequest { action: direction })
            .await
        {
            Ok(status) => Ok(format!("tab {} scroll_y={}", tab.id, status.scroll_y)),
            Err(e) => {
                if e.invalidates_target() {
                    self.registry.invalidate(tab.id);
                }
                self.metrics.inc(&self.metrics.delivery_failures);
                Err(anyhow!(e).context(format!("delivery to tab {} failed", tab.id)))
            }
        }
    }

    async fn switch_tab(&mut self, step: TabStep) -> Result<String> {
        let tabs = self.host.list_tabs().await?;
        let position = tabs
            .iter()
            .position(|t| t.active)
            .ok_or_else(|| anyhow!("no active tab in window"))?;
        let target = neighbor_index(position, tabs.len(), step)
            .and_then(|i| tabs.get(i))
            .ok_or_else(|| anyhow!("no neighbour tab"))?;

        self.host.activate(target.id).await?;
        Ok(format!("activated tab {} at index {}", target.id, target.index))
    }

    async fn reload_active(&mut self) -> Result<String> {
        let tab = self.active_tab().await?;
        self.host.reload(tab.id).await?;
        self.registry.invalidate(tab.id);
        Ok(format!("reloaded tab {}", tab.id))
    }

    async fn active_tab(&self) -> Result<TabInfo> {
        self.host
            .list_tabs()
            .await?
            .into_iter()
            .find(|t| t.active)
            .ok_or_else(|| anyhow!("no active tab in window"))
    }

    async fn install(&mut self, tab: TabId) -> Result<()> {
        match self.host.install_executor(tab).await {
            Ok(()) => {
                self.registry.mark_installed(tab);
                self.metrics.inc(&self.metrics.executor_installs);
                info!("💉 Executor installed in tab {}", tab);
                Ok(())
            }
            Err(e) => {
                self.metrics.inc(&self.metrics.install_failures);
                warn!("Executor installation in tab {} failed: {:#}", tab, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{ScrollExecutor, SimulatedBrowser};
    use crate::dispatch::MessageBus;
    use crate::types::ScrollConfig;

    fn controller(urls: &[&str]) -> (BackgroundController<SimulatedBrowser>, SimulatedBrowser) {
        let sim = SimulatedBrowser::with_urls(ScrollExecutor::new(&ScrollConfig::default()), urls);
        (BackgroundController::new(sim.clone(), PipelineMetrics::new()), sim)
    }

    const THREE: [&str; 3] = ["https://a.test", "https://b.test", "https://c.test"];

    #[test]
    fn test_neighbor_index_wraps() {
        assert_eq!(neighbor_index(0, 3, TabStep::Previous), Some(2));
        assert_eq!(neighbor_index(2, 3, TabStep::Next), Some(0));
        assert_eq!(neighbor_index(1, 3, TabStep::Next), Some(2));
        assert_eq!(neighbor_index(0, 1, TabStep::Next), Some(0));
        assert_eq!(neighbor_index(0, 0, TabStep::Next), None);
    }

    #[tokio::test]
    async fn test_tab_cycling_wraps_around() {
        let (mut ctl, sim) = controller(&THREE);
        assert_eq!(sim.active_tab(), Some(1));

        assert!(ctl.perform(Action::Left).await.ok);
        assert_eq!(sim.active_tab(), Some(3));

        assert!(ctl.perform(Action::Right).await.ok);
        assert_eq!(sim.active_tab(), Some(1));
        assert_eq!(sim.install_count(), 0);
    }

    async fn gesture(ctl: &mut BackgroundController<SimulatedBrowser>, action: Action) -> Reply {
        let (reply, answer) = tokio::sync::oneshot::channel();
        ctl.handle_event(ConsumerEvent::Message {
            message: InboundMessage::gesture(action),
            reply,
        })
        .await;
        answer.await.unwrap()
    }

    #[tokio::test]
    async fn test_gesture_tab_switch_pre_installs() {
        let urls = ["https://a.test", "chrome://settings", "https://c.test"];
        let (mut ctl, sim) = controller(&urls);

        assert!(gesture(&mut ctl, Action::Right).await.ok);
        assert_eq!(sim.active_tab(), Some(2));
        assert_eq!(sim.install_count(), 0);

        assert!(gesture(&mut ctl, Action::Right).await.ok);
        assert_eq!(sim.active_tab(), Some(3));
        assert!(ctl.registry().is_installed(3));
        assert!(sim.has_executor(3));

        // Already installed: the scroll goes straight through.
        assert!(gesture(&mut ctl, Action::ScrollDown).await.ok);
        assert_eq!(sim.install_count(), 1);
        assert_eq!(sim.scroll_y(3), Some(100));
    }

    #[tokio::test]
    async fn test_removed_tab_loses_executor_entry() {
        let (mut ctl, sim) = controller(&THREE);
        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert!(ctl.registry().is_installed(1));

        let event = sim.close_tab(1).unwrap();
        ctl.handle_tab_event(event).await;
        assert!(!ctl.registry().is_installed(1));
        assert!(ctl.registry().is_empty());

        // Focus moved to tab 2, which gets its own executor.
        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert!(ctl.registry().is_installed(2));
        assert_eq!(sim.install_count(), 2);
        assert_eq!(sim.scroll_y(2), Some(100));
    }

    #[tokio::test]
    async fn test_install_is_idempotent_until_navigation() {
        let (mut ctl, sim) = controller(&THREE);

        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert_eq!(sim.install_count(), 1);
        assert_eq!(sim.scroll_y(1), Some(200));

        let event = sim.navigate(1, "https://a.test/next").unwrap();
        ctl.handle_tab_event(event).await;
        assert!(!ctl.registry().is_installed(1));

        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert_eq!(sim.install_count(), 2);
    }

    #[tokio::test]
    async fn test_install_failure_drops_action() {
        let (mut ctl, sim) = controller(&THREE);
        sim.fail_installs(true);

        let reply = ctl.perform(Action::ScrollDown).await;
        assert!(!reply.ok);
        assert_eq!(sim.scroll_y(1), Some(0));
        assert!(!ctl.registry().is_installed(1));

        sim.fail_installs(false);
        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert_eq!(sim.install_count(), 2);
        assert_eq!(sim.scroll_y(1), Some(100));
    }

    #[tokio::test]
    async fn test_missing_executor_self_heals() {
        let (mut ctl, sim) = controller(&THREE);
        assert!(ctl.perform(Action::ScrollDown).await.ok);

        sim.drop_executor(1);
        let reply = ctl.perform(Action::ScrollDown).await;
        assert!(!reply.ok);
        assert!(!ctl.registry().is_installed(1));

        assert!(ctl.perform(Action::ScrollDown).await.ok);
        assert_eq!(sim.install_count(), 2);
        assert_eq!(sim.scroll_y(1), Some(200));
    }

    #[tokio::test]
    async fn test_stop_reloads_active_tab() {
        let (mut ctl, sim) = controller(&THREE);
        sim.set_active(2);
        ctl.perform(Action::ScrollDown).await;
        assert!(ctl.registry().is_installed(2));

        assert!(ctl.perform(Action::Stop).await.ok);
        assert_eq!(sim.reload_count(2), 1);
        assert_eq!(sim.reload_count(1), 0);
        assert!(!ctl.registry().is_installed(2));
    }

    #[tokio::test]
    async fn test_commands_share_action_handler() {
        let (mut ctl, sim) = controller(&THREE);

        let reply = ctl
            .handle_message(InboundMessage::Command {
                command: "tab-right".into(),
            })
            .await;
        assert!(reply.ok);
        assert_eq!(sim.active_tab(), Some(2));

        let reply = ctl
            .handle_message(InboundMessage::Command {
                command: "zoom".into(),
            })
            .await;
        assert!(!reply.ok);
        assert_eq!(sim.active_tab(), Some(2));
    }

    #[tokio::test]
    async fn test_activation_pre_installs_on_web_pages_only() {
        let (mut ctl, sim) = controller(&["https://a.test", "chrome://settings"]);

        let event = sim.set_active(1).unwrap();
        ctl.handle_tab_event(event.clone()).await;
        ctl.handle_tab_event(event).await;
        assert!(sim.has_executor(1));
        assert_eq!(sim.install_count(), 1);

        let event = sim.set_active(2).unwrap();
        ctl.handle_tab_event(event).await;
        assert_eq!(sim.install_count(), 1);
    }

    #[tokio::test]
    async fn test_run_serves_bus_until_closed() {
        let (ctl, sim) = controller(&THREE);
        let (bus, inbox) = MessageBus::channel(8);
        let task = tokio::spawn(ctl.run(inbox));

        let reply = bus.send(InboundMessage::gesture(Action::ScrollDown)).await.unwrap();
        assert!(reply.ok);

        bus.reinitialize().await.unwrap();
        drop(bus);

        let ctl = task.await.unwrap();
        assert!(ctl.registry().is_empty());
        assert_eq!(sim.scroll_y(1), Some(100));
    }
}
