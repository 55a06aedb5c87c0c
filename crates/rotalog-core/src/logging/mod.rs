//! Line formatting, the file and console writers, and the tracing bridge.
//!
//! Every line has the same shape on disk and on the console:
//!
//! ```text
//! 2026/01/21 14:30:45 main.rs:42: info: connected to peer
//! ```

pub mod entry;
pub mod layer;
pub(crate) mod writer;

pub use entry::{render_line, LogLine, TIMESTAMP_FORMAT};
pub use layer::SinkLayer;
