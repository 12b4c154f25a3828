//! Device profiles applied to every page a session opens.
//!
//! The profile fixes the user agent and viewport before any navigation so the
//! site serves the legacy desktop markup the selectors in [`crate::profile`]
//! and [`crate::dm`] are written against.

use chromiumoxide::handler::viewport::Viewport;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// A named user-agent plus viewport combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: String,
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
}

impl DeviceProfile {
    /// The stock desktop profile used when the config does not override it.
    pub fn desktop() -> Self {
        Self {
            name: "desktop".into(),
            user_agent: DESKTOP_USER_AGENT.into(),
            width: 1280,
            height: 800,
        }
    }

    /// Build the effective profile from config, starting from [`desktop`].
    ///
    /// [`desktop`]: DeviceProfile::desktop
    pub fn from_config(config: &warble_config::BrowserConfig) -> Self {
        let mut profile = Self::desktop();
        if let Some(ua) = &config.user_agent {
            profile.user_agent = ua.clone();
        }
        if let Some(width) = config.viewport_width {
            profile.width = width;
        }
        if let Some(height) = config.viewport_height {
            profile.height = height;
        }
        profile
    }

    /// The CDP viewport for this profile.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn desktop_defaults() {
        let profile = DeviceProfile::desktop();
        assert_eq!(profile.width, 1280);
        assert_eq!(profile.height, 800);
        assert!(profile.user_agent.contains("Chrome/114"));
    }

    #[test]
    fn config_overrides_win() {
        let config = warble_config::BrowserConfig {
            user_agent: Some("test-agent".into()),
            viewport_width: Some(800),
            ..Default::default()
        };
        let profile = DeviceProfile::from_config(&config);
        assert_eq!(profile.user_agent, "test-agent");
        assert_eq!(profile.width, 800);
        // height untouched by a width-only override
        assert_eq!(profile.height, 800);
    }

    #[test]
    fn viewport_is_desktop_shaped() {
        let viewport = DeviceProfile::desktop().viewport();
        assert!(!viewport.emulating_mobile);
        assert!(!viewport.has_touch);
        assert_eq!(viewport.device_scale_factor, Some(1.0));
    }
}
