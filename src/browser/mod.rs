//! Browser discovery and launching for the verification page.

use std::io;
use std::path::PathBuf;

use strum::{Display, EnumString};

/// A browser the verification page can be opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Browser {
    Chrome,
    Chromium,
    Safari,
    Firefox,
    Brave,
    Edge,
}

impl Browser {
    /// Name handed to the OS launcher for this browser.
    pub fn app_name(self) -> &'static str {
        if cfg!(target_os = "macos") {
            match self {
                Self::Chrome => "Google Chrome",
                Self::Chromium => "Chromium",
                Self::Safari => "Safari",
                Self::Firefox => "Firefox",
                Self::Brave => "Brave Browser",
                Self::Edge => "Microsoft Edge",
            }
        } else if cfg!(windows) {
            match self {
                Self::Chrome => "chrome",
                Self::Edge => "msedge",
                Self::Firefox => "firefox",
                Self::Brave => "brave",
                Self::Chromium => "chromium",
                Self::Safari => "safari",
            }
        } else {
            match self {
                Self::Chrome => "google-chrome",
                Self::Chromium => "chromium",
                Self::Firefox => "firefox",
                Self::Brave => "brave-browser",
                Self::Edge => "microsoft-edge",
                Self::Safari => "safari",
            }
        }
    }
}

/// Finds installed browsers and opens URLs in them.
pub trait BrowserLauncher {
    /// Installed browsers, in display order.
    fn detect(&self) -> Vec<Browser>;

    fn open(&self, browser: Browser, url: &str) -> io::Result<()>;
}

/// The host's real browsers.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowsers;

impl BrowserLauncher for SystemBrowsers {
    fn detect(&self) -> Vec<Browser> {
        let found = detect_installed();
        tracing::debug!(?found, "detected browsers");
        found
    }

    fn open(&self, browser: Browser, url: &str) -> io::Result<()> {
        match launch_target(browser) {
            Some(app) => open::with_detached(url, app),
            None => open::that_detached(url),
        }
    }
}

#[cfg(target_os = "macos")]
fn detect_installed() -> Vec<Browser> {
    let apps = std::path::Path::new("/Applications");
    let installed = |bundle: &str| apps.join(bundle).exists();
    let mut found = Vec::new();
    if ["Google Chrome.app", "Google Chrome Canary.app"]
        .iter()
        .any(|b| installed(b))
    {
        found.push(Browser::Chrome);
    }
    let bundles = [
        ("Chromium.app", Browser::Chromium),
        ("Safari.app", Browser::Safari),
        ("Firefox.app", Browser::Firefox),
        ("Brave Browser.app", Browser::Brave),
        ("Microsoft Edge.app", Browser::Edge),
    ];
    found.extend(
        bundles
            .into_iter()
            .filter(|(bundle, _)| installed(bundle))
            .map(|(_, browser)| browser),
    );
    found
}

#[cfg(windows)]
fn detect_installed() -> Vec<Browser> {
    let mut found = Vec::new();
    if !chrome_install_paths().is_empty() {
        found.push(Browser::Chrome);
    }
    // Ships with every supported Windows release.
    found.push(Browser::Edge);
    found
}

#[cfg(not(any(target_os = "macos", windows)))]
fn detect_installed() -> Vec<Browser> {
    let candidates: [(&[&str], Browser); 5] = [
        (&["google-chrome", "google-chrome-stable"], Browser::Chrome),
        (&["chromium", "chromium-browser"], Browser::Chromium),
        (&["firefox"], Browser::Firefox),
        (&["brave-browser", "brave"], Browser::Brave),
        (&["microsoft-edge", "microsoft-edge-stable"], Browser::Edge),
    ];
    candidates
        .into_iter()
        .filter(|(names, _)| names.iter().any(|name| find_executable(name).is_some()))
        .map(|(_, browser)| browser)
        .collect()
}

/// What to pass to `open::with_detached`, or `None` for the default handler.
fn launch_target(browser: Browser) -> Option<String> {
    if cfg!(windows) {
        return match browser {
            Browser::Chrome => chrome_install_paths()
                .into_iter()
                .next()
                .map(|p| p.display().to_string()),
            Browser::Edge => Some(browser.app_name().to_string()),
            _ => None,
        };
    }
    if cfg!(target_os = "macos") {
        return Some(browser.app_name().to_string());
    }
    let names: &[&str] = match browser {
        Browser::Chrome => &["google-chrome", "google-chrome-stable"],
        Browser::Chromium => &["chromium", "chromium-browser"],
        Browser::Firefox => &["firefox"],
        Browser::Brave => &["brave-browser", "brave"],
        Browser::Edge => &["microsoft-edge", "microsoft-edge-stable"],
        Browser::Safari => &[],
    };
    names
        .iter()
        .find(|name| find_executable(name).is_some())
        .map(|name| name.to_string())
}

fn chrome_install_paths() -> Vec<PathBuf> {
    ["LOCALAPPDATA", "PROGRAMFILES", "PROGRAMFILES(X86)"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|base| {
            PathBuf::from(base)
                .join("Google")
                .join("Chrome")
                .join("Application")
                .join("chrome.exe")
        })
        .filter(|path| path.is_file())
        .collect()
}

/// Locate `name` on `PATH` (honoring `PATHEXT` on Windows).
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Browser::from_str("firefox").unwrap(), Browser::Firefox);
        assert_eq!(Browser::from_str("EDGE").unwrap(), Browser::Edge);
        assert!(Browser::from_str("lynx").is_err());
    }

    #[test]
    fn display_uses_variant_name() {
        assert_eq!(Browser::Brave.to_string(), "Brave");
    }

    #[test]
    fn missing_executable_is_not_found() {
        assert_eq!(find_executable("definitely-not-a-browser-binary"), None);
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_found_on_path() {
        let found = find_executable("sh").expect("sh on PATH");
        assert!(found.is_absolute());
        assert_eq!(found.file_name().unwrap(), "sh");
    }
}
