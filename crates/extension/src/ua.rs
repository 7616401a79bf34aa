//! Browser detection from User-Agent data

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CHROME_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Chrom\w*/(\d+)").unwrap());
static FIREFOX_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Firefox\w*/(\d+)").unwrap());
static OPERA_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:Opera|OPR)\w*/(\d+)").unwrap());
static VIVALDI_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Vivaldi\w*/(\d+)").unwrap());
static MAC_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mac").unwrap());

/// One entry of the Client Hints brand list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub brand: String,
    pub version: String,
}

impl Brand {
    pub fn new(brand: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            version: version.into(),
        }
    }
}

/// Detected browser and platform
///
/// Version fields hold the major version. Firefox is only reported when
/// no Chromium brand was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAgent {
    pub chrome: Option<u32>,
    pub firefox: Option<u32>,
    pub opera: Option<u32>,
    pub vivaldi: Option<u32>,
    pub mac: bool,
    pub mobile: bool,
    pub windows: bool,
}

impl UserAgent {
    /// Detect from Client Hints (`navigator.userAgentData`)
    pub fn from_client_hints(brands: &[Brand], platform: &str, mobile: bool) -> Self {
        let joined = brands
            .iter()
            .map(|b| format!("{}/{}", b.brand, b.version))
            .collect::<Vec<_>>()
            .join(" ");
        Self::parse(&joined, platform, Some(mobile))
    }

    /// Detect from a classic User-Agent string
    pub fn from_user_agent(ua: &str) -> Self {
        Self::parse(ua, ua, None)
    }

    /// Detect from a brand string and platform
    ///
    /// Without an explicit `mobile` flag, Android in `brands` means mobile.
    pub fn parse(brands: &str, platform: &str, mobile: Option<bool>) -> Self {
        let chrome = major_version(&CHROME_RX, brands);
        let mobile = mobile.unwrap_or_else(|| brands.contains("Android"));
        Self {
            chrome,
            firefox: if chrome.is_some() {
                None
            } else {
                major_version(&FIREFOX_RX, brands)
            },
            opera: major_version(&OPERA_RX, brands),
            vivaldi: major_version(&VIVALDI_RX, brands),
            mac: MAC_RX.is_match(platform),
            mobile,
            windows: platform.contains("Windows"),
        }
    }

    /// Chrome 62-74 draw a broken border around extension popups
    pub fn chrome_popup_border_bug(&self) -> bool {
        matches!(self.chrome, Some(62..=74))
    }

    /// Browser page for configuring keyboard shortcuts
    pub fn configure_commands_url(&self) -> &'static str {
        if self.opera.is_some() {
            "opera://settings/configureCommands"
        } else {
            "chrome://extensions/configureCommands"
        }
    }

    /// Root CSS classes for the detected environment
    pub fn root_classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.mobile {
            classes.push("mobile");
        }
        if !self.windows {
            classes.push("non-windows");
        }
        if self.firefox.is_some() {
            classes.push("firefox");
        } else if self.opera.is_some() {
            classes.push("opera");
        } else if self.vivaldi.is_some() {
            classes.push("vivaldi");
        }
        classes
    }
}

/// First capture group as a non-zero major version
fn major_version(rx: &Regex, text: &str) -> Option<u32> {
    rx.captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|&v: &u32| v != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_hints_chrome() {
        let brands = [
            Brand::new("Not.A/Brand", "8"),
            Brand::new("Chromium", "114"),
            Brand::new("Google Chrome", "114"),
        ];
        let ua = UserAgent::from_client_hints(&brands, "Windows", false);

        assert_eq!(ua.chrome, Some(114));
        assert_eq!(ua.firefox, None);
        assert!(ua.windows);
        assert!(!ua.mac);
        assert!(!ua.chrome_popup_border_bug());
        assert!(ua.root_classes().is_empty());
    }

    #[test]
    fn test_user_agent_firefox_android() {
        let ua = UserAgent::from_user_agent(
            "Mozilla/5.0 (Android 13; Mobile; rv:120.0) Gecko/120.0 Firefox/120.0",
        );
        assert_eq!(ua.chrome, None);
        assert_eq!(ua.firefox, Some(120));
        assert!(ua.mobile);
        assert_eq!(ua.root_classes(), vec!["mobile", "non-windows", "firefox"]);
    }

    #[test]
    fn test_user_agent_opera_mac() {
        let ua = UserAgent::from_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36 OPR/57.0.3098.106",
        );
        assert_eq!(ua.chrome, Some(70));
        assert_eq!(ua.opera, Some(57));
        assert!(ua.mac);
        assert!(ua.chrome_popup_border_bug());
        assert_eq!(ua.configure_commands_url(), "opera://settings/configureCommands");
    }
}
