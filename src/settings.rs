//! Host Application Settings
//!
//! [`AppInfo`] is the configuration record the host application hands to the
//! renderer at startup. It is plain serializable data so hosts can load it
//! from a settings file instead of hard-coding it.

use serde::{Deserialize, Serialize};

/// Number of in-flight back buffers the uniform ring is sized for.
///
/// The CPU writes frame *N+1*'s uniforms while the GPU still consumes frame
/// *N*'s slot; the presentation engine's back-buffer index gates slot reuse.
pub const MAX_BACK_BUFFERS: u32 = 3;

/// Startup configuration supplied by the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    /// Application name, used for backend debug labels.
    pub name: String,
    /// Presentation width in pixels.
    pub width: u32,
    /// Presentation height in pixels.
    pub height: u32,
    /// Requested number of in-flight back buffers (clamped to 2..=3).
    pub num_back_buffers: u32,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Ember App".to_string(),
            width: 1280,
            height: 720,
            num_back_buffers: 2,
        }
    }
}

impl AppInfo {
    /// The effective back-buffer count: the requested value clamped to the
    /// double/triple-buffered ring the concurrency model assumes.
    #[must_use]
    pub fn back_buffer_count(&self) -> u32 {
        self.num_back_buffers.clamp(2, MAX_BACK_BUFFERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fall_back_to_defaults() {
        let info: AppInfo = serde_json::from_str(r#"{ "width": 900, "height": 600 }"#).unwrap();
        assert_eq!(info.width, 900);
        assert_eq!(info.height, 600);
        assert_eq!(info.num_back_buffers, 2);
        assert_eq!(info.name, "Ember App");
    }

    #[test]
    fn test_back_buffer_count_is_clamped() {
        let mut info = AppInfo::default();

        info.num_back_buffers = 1;
        assert_eq!(info.back_buffer_count(), 2);

        info.num_back_buffers = 8;
        assert_eq!(info.back_buffer_count(), MAX_BACK_BUFFERS);
    }
}
