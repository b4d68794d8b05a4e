//! Slide capture: rasterizing surfaces into [`CapturedSlide`](crate::model::CapturedSlide)s.
//!
//! A [`RenderBackend`] knows how to reach and draw a surface. The
//! [`Rasterizer`] wraps it with the readiness steps every capture needs, and
//! the [`CaptureOrchestrator`] runs the rasterizer over a whole deck, one
//! slide at a time.

mod backend;
mod orchestrator;
mod rasterizer;

pub use backend::{ImageFileBackend, RenderBackend};
pub use orchestrator::{CaptureFailure, CaptureOrchestrator, CaptureReport};
pub use rasterizer::Rasterizer;
