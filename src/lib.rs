// src/lib.rs
//
// Hand-gesture navigation: landmark frames in, debounced browser actions out.
//
//   PoseEstimator → RecognitionSession ─┬→ classifiers → GestureHistory
//                                       └→ ConfirmationEngine → ActionDispatcher
//                                                 ─(MessageBus)→ BackgroundController → TabHost

pub mod clock;
pub mod config;
pub mod confirmation;
pub mod consumer;
pub mod dispatch;
pub mod estimator;
pub mod pipeline;
pub mod recognition;
pub mod types;
