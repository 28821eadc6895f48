//! snapread — image-to-text HTTP service.
//!
//! Accepts a base64-encoded image over HTTP, stages it in transient blob
//! storage, drives an asynchronous Read OCR operation to completion, and
//! returns the recognized text. Per-client sliding-window rate limiting, an
//! origin allow-list, decoded-size caps, and guaranteed storage cleanup are
//! built into the request pipeline.

pub mod api;
pub mod config;
pub mod error;
pub mod ocr;
pub mod origin;
pub mod pipeline;
pub mod ratelimit;
pub mod storage;
