//! Error types for the Nova renderer
//!
//! This module defines the error types used throughout the renderer,
//! covering backend call failures, initialization, memory-type lookup,
//! and shader binary loading.

use ash::vk;
use std::fmt;

/// Result type for Nova renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova renderer errors
///
/// Every variant is fatal to the caller: the only transient condition in
/// the presentation path (a swapchain that is out of date) is reported
/// through [`crate::FrameAcquire`] / [`crate::FrameOutcome`], never as an
/// `Error`.
#[derive(Debug, Clone)]
pub enum Error {
    /// Non-success status from a Vulkan call
    BackendError(String),

    /// Initialization failed (instance, surface, device, swapchain)
    InitializationFailed(String),

    /// No memory type satisfies the requested type bits and property
    /// flags. There is no fallback search strategy.
    NoCompatibleMemoryType {
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    },

    /// A SPIR-V shader binary could not be read or was malformed
    ShaderLoadFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoCompatibleMemoryType { type_bits, flags } => write!(
                f,
                "No compatible memory type for type bits {:#010b} with flags {:?}",
                type_bits, flags
            ),
            Error::ShaderLoadFailed(msg) => write!(f, "Shader load failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
