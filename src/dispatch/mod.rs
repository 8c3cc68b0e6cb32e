// src/dispatch/mod.rs
//
// Producer → consumer delivery.
//
//   ConfirmationEngine ─Action→ ActionDispatcher ─InboundMessage→ MessageBus
//       ─(mpsc)→ consumer task ─Reply (oneshot)→ back to the dispatcher task

mod bus;
mod dispatcher;
mod error;
mod messages;

pub use bus::{ConsumerEvent, MessageBus};
pub use dispatcher::ActionDispatcher;
pub use error::DeliveryError;
pub use messages::{ExecutorRequest, ExecutorStatus, InboundMessage, Reply, ScrollDirection};
