//! Asynchronous OCR backend integration.
//!
//! The Read API is submit-then-poll: submission returns immediately with an
//! operation reference, and the analysis completes out-of-band. `OcrPoller`
//! turns that into a single bounded call — it polls at a fixed interval until
//! the operation reaches a terminal state or the attempt ceiling converts
//! indefinite waiting into a deterministic timeout.

mod client;
mod poller;
mod text;
mod types;

pub use client::{OcrApi, VisionClient};
pub use poller::OcrPoller;
pub use text::flatten_text;
pub use types::{AnalyzeResult, OperationStatus, ReadLine, ReadOperation, ReadResult, ReadWord};
