//! Render-service integration.
//!
//! The validation core never renders configuration itself; it consumes the
//! [`RenderSource`] capability. This module defines that capability and
//! provides the HTTP client implementation used by the CLI.

mod client;
mod source;

pub use client::RenderClient;
pub use source::RenderSource;

#[cfg(test)]
pub use source::MockRenderSource;
