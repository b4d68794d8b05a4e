//! Data model shared by the capture and encoding stages.
//!
//! Slides enter the pipeline as [`SlideSurface`]s borrowed from the host,
//! become immutable [`CapturedSlide`]s after rasterization, and leave as an
//! [`ExportResult`] envelope. [`ExportProgress`] snapshots are pushed to the
//! caller along the way.

mod options;
mod progress;
mod result;
mod slide;

pub use options::*;
pub use progress::*;
pub use result::*;
pub use slide::*;
