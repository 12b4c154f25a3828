//! Chromium executable detection and install guidance.

use std::path::{Path, PathBuf};

/// Executable names probed on `PATH`, most specific first. Anything that
/// speaks CDP works.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chrome",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge-stable",
    "brave-browser",
    "brave",
];

#[cfg(target_os = "macos")]
const MACOS_APP_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const WINDOWS_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

/// Outcome of a detection pass.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub found: bool,
    pub path: Option<PathBuf>,
    /// Platform-specific install instructions, empty when found.
    pub install_hint: String,
}

impl DetectionResult {
    fn found_at(path: PathBuf) -> Self {
        Self {
            found: true,
            path: Some(path),
            install_hint: String::new(),
        }
    }
}

/// Locate a Chromium-based browser.
///
/// Checks, in order: the configured path, the `CHROME` environment variable,
/// platform install locations, then executable names on `PATH`. Install
/// locations are tried before `PATH` because `PATH` can hold broken wrapper
/// scripts.
pub fn detect_browser(configured: Option<&Path>) -> DetectionResult {
    if let Some(path) = configured
        && path.exists()
    {
        return DetectionResult::found_at(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("CHROME") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    #[cfg(target_os = "macos")]
    for path in MACOS_APP_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    #[cfg(target_os = "windows")]
    for path in WINDOWS_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    for name in CHROMIUM_EXECUTABLES {
        if let Ok(path) = which::which(name) {
            return DetectionResult::found_at(path);
        }
    }

    DetectionResult {
        found: false,
        path: None,
        install_hint: install_instructions(),
    }
}

/// Platform-specific install instructions for the error path.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Any Chromium-based browser works (Chrome, Chromium, Edge, Brave).\n\n\
         Or point the server at one:\n  \
         [browser]\n  \
         executable = \"/path/to/browser\"\n\n\
         Or set the CHROME environment variable."
    )
}

/// Detect at startup and warn loudly when nothing is installed.
///
/// Sessions cannot be provisioned without a browser, so the warning goes to
/// stderr as well as the log.
pub fn check_and_warn(configured: Option<&Path>) -> bool {
    let result = detect_browser(configured);

    if !result.found {
        eprintln!("\nwarning: no Chrome/Chromium install found; sessions will fail to start");
        eprintln!("{}", result.install_hint);
        eprintln!();
        tracing::warn!(
            "no Chrome/Chromium install found; sessions will fail to start\n{}",
            result.install_hint
        );
    } else if let Some(ref path) = result.path {
        tracing::info!(path = %path.display(), "browser detected");
    }

    result.found
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn install_instructions_not_empty() {
        let hint = install_instructions();
        assert!(hint.contains("Chrome"));
        assert!(hint.contains("executable ="));
    }

    #[test]
    fn configured_path_takes_precedence() {
        let temp_dir = std::env::temp_dir();
        let fake_browser = temp_dir.join("fake-chrome-for-detect-test");
        std::fs::write(&fake_browser, "fake").unwrap();

        let result = detect_browser(Some(&fake_browser));
        assert!(result.found);
        assert_eq!(result.path.as_ref().unwrap(), &fake_browser);
        assert!(result.install_hint.is_empty());

        std::fs::remove_file(&fake_browser).unwrap();
    }

    #[test]
    fn invalid_configured_path_falls_through() {
        let result = detect_browser(Some(Path::new("/nonexistent/path/to/chrome")));
        // Whether anything is found depends on the host; either way the
        // bogus path must not be reported back.
        assert_ne!(
            result.path.as_deref(),
            Some(Path::new("/nonexistent/path/to/chrome"))
        );
    }

    #[test]
    fn executable_list_covers_the_basics() {
        assert!(CHROMIUM_EXECUTABLES.contains(&"chrome"));
        assert!(CHROMIUM_EXECUTABLES.contains(&"chromium"));
    }
}
