// src/consumer/mod.rs

pub mod controller;
pub mod executor;
pub mod host;
pub mod registry;
pub mod simulated;

pub use controller::{neighbor_index, BackgroundController, TabStep};
pub use executor::{PageState, ScrollExecutor};
pub use host::{is_scriptable_url, TabEvent, TabHost, TabId, TabInfo};
pub use registry::InjectionRegistry;
pub use simulated::SimulatedBrowser;
