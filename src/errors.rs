//! Error Types
//!
//! This module defines the error types used throughout the renderer core.
//!
//! # Overview
//!
//! The main error type [`RenderError`] covers all failure modes of the
//! orchestration layer:
//! - Resource handle resolution failures
//! - Named render-target resolution failures
//! - Descriptor validation failures
//! - Errors reported by the graphics backend
//!
//! Resource-resolution failures are configuration errors: a correctly
//! configured pass stack never produces them at runtime. They are fatal to
//! the frame being recorded; the frame is abandoned without submitting a
//! partially recorded command list.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, RenderError>`.

use thiserror::Error;

/// The main error type for the Ember renderer core.
#[derive(Error, Debug)]
pub enum RenderError {
    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A resource handle was zero (unset) or out of the pool's range.
    #[error("Invalid {kind} handle: {index}")]
    InvalidHandle {
        /// The resource kind the handle was resolved against.
        kind: &'static str,
        /// The offending handle index.
        index: u32,
    },

    /// A pass requested a named render target that no earlier pass registered.
    #[error("Unknown render target name: {0}")]
    UnknownTargetName(String),

    /// A creation descriptor failed validation (e.g. a mip count inconsistent
    /// with the texture dimensions).
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The graphics device reported a failure during resource creation or
    /// command submission.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
