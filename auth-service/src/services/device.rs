//! Device classification from the raw User-Agent string and request addresses.
//!
//! Classification is a pure function: identical inputs always produce the
//! same fingerprint, every branch has an `unknown` fallback, and nothing here
//! can fail or touch the network.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Browsers the login policy knows about. Adding a variant forces a
/// compile-time decision in the policy engine's match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    Chrome,
    Edge,
    Firefox,
    Safari,
    Opera,
    InternetExplorer,
    Unknown,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Edge => "edge",
            Browser::Firefox => "firefox",
            Browser::Safari => "safari",
            Browser::Opera => "opera",
            Browser::InternetExplorer => "ie",
            Browser::Unknown => "unknown",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Browser::Chrome => "Google Chrome",
            Browser::Edge => "Microsoft Edge",
            Browser::Firefox => "Mozilla Firefox",
            Browser::Safari => "Apple Safari",
            Browser::Opera => "Opera",
            Browser::InternetExplorer => "Internet Explorer",
            Browser::Unknown => "Unknown Browser",
        }
    }

    /// Microsoft-family browsers get direct access under the login policy.
    pub fn is_microsoft(&self) -> bool {
        matches!(self, Browser::Edge | Browser::InternetExplorer)
    }
}

/// Coarse device bucket derived from the User-Agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserInfo {
    pub name: Browser,
    pub version: String,
}

impl BrowserInfo {
    pub fn display_name(&self) -> String {
        if self.version == "unknown" {
            self.name.full_name().to_string()
        } else {
            format!("{} {}", self.name.full_name(), self.version)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
    pub platform: String,
}

impl OsInfo {
    fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            version: "unknown".to_string(),
            platform: "unknown".to_string(),
        }
    }
}

/// Structured facts about the client, derived per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFingerprint {
    pub user_agent: String,
    pub ip_address: String,
    pub browser: BrowserInfo,
    pub os: OsInfo,
    pub device_type: DeviceType,
}

struct BrowserProbe {
    browser: Browser,
    matches: fn(&str) -> bool,
    version: fn(&str) -> Option<String>,
}

/// Browser probes, evaluated front to back; the first hit wins.
///
/// The order is load-bearing because vendor tokens overlap: Edge UAs carry
/// "chrome/", Chrome UAs carry "safari/". Keep Edge before Chrome and Chrome
/// before Safari.
const BROWSER_PROBES: &[BrowserProbe] = &[
    BrowserProbe {
        browser: Browser::Edge,
        matches: |ua| ua.contains("edg/") || ua.contains("edge/"),
        version: |ua| version_after(ua, "edg/").or_else(|| version_after(ua, "edge/")),
    },
    BrowserProbe {
        browser: Browser::Chrome,
        matches: |ua| ua.contains("chrome/"),
        version: |ua| version_after(ua, "chrome/"),
    },
    BrowserProbe {
        browser: Browser::Firefox,
        matches: |ua| ua.contains("firefox/"),
        version: |ua| version_after(ua, "firefox/"),
    },
    BrowserProbe {
        browser: Browser::Safari,
        matches: |ua| ua.contains("safari/") && !ua.contains("chrome"),
        version: |ua| version_after(ua, "version/"),
    },
    BrowserProbe {
        browser: Browser::Opera,
        matches: |ua| ua.contains("opera/") || ua.contains("opr/"),
        version: |ua| version_after(ua, "opr/").or_else(|| version_after(ua, "opera/")),
    },
    BrowserProbe {
        browser: Browser::InternetExplorer,
        matches: |ua| ua.contains("msie") || ua.contains("trident/"),
        version: |ua| version_after(ua, "msie ").or_else(|| version_after(ua, "rv:")),
    },
];

/// Best-effort version string following `token`: digits and dots only.
fn version_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let version: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

/// Like `version_after` but accepts the underscore separators Apple uses
/// ("mac os x 10_15_7"), normalized to dots.
fn apple_version_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let version: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '_' || *c == '.')
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version.replace('_', "."))
    }
}

fn detect_browser(ua: &str) -> BrowserInfo {
    for probe in BROWSER_PROBES {
        if (probe.matches)(ua) {
            return BrowserInfo {
                name: probe.browser,
                version: (probe.version)(ua).unwrap_or_else(|| "unknown".to_string()),
            };
        }
    }
    BrowserInfo {
        name: Browser::Unknown,
        version: "unknown".to_string(),
    }
}

fn detect_os(ua: &str) -> OsInfo {
    // Windows NT versions are bucketed by their NT token.
    const WINDOWS_BUCKETS: &[(&str, &str)] = &[
        ("windows nt 10.0", "10/11"),
        ("windows nt 6.3", "8.1"),
        ("windows nt 6.2", "8"),
        ("windows nt 6.1", "7"),
    ];
    for (token, version) in WINDOWS_BUCKETS {
        if ua.contains(token) {
            return OsInfo {
                name: "Windows".to_string(),
                version: (*version).to_string(),
                platform: "windows".to_string(),
            };
        }
    }
    if ua.contains("windows") {
        return OsInfo {
            name: "Windows".to_string(),
            version: "unknown".to_string(),
            platform: "windows".to_string(),
        };
    }

    // iOS before macOS: iPad UAs can masquerade with "mac os x" tokens too.
    if ua.contains("iphone") || ua.contains("ipad") {
        return OsInfo {
            name: "iOS".to_string(),
            version: apple_version_after(ua, "os ").unwrap_or_else(|| "unknown".to_string()),
            platform: "ios".to_string(),
        };
    }

    if ua.contains("mac os x") {
        return OsInfo {
            name: "macOS".to_string(),
            version: apple_version_after(ua, "mac os x ")
                .unwrap_or_else(|| "unknown".to_string()),
            platform: "mac".to_string(),
        };
    }

    if ua.contains("android") {
        return OsInfo {
            name: "Android".to_string(),
            version: version_after(ua, "android ").unwrap_or_else(|| "unknown".to_string()),
            platform: "android".to_string(),
        };
    }

    if ua.contains("linux") {
        return OsInfo {
            name: "Linux".to_string(),
            version: "unknown".to_string(),
            platform: "linux".to_string(),
        };
    }

    OsInfo::unknown()
}

fn detect_device_type(ua: &str) -> DeviceType {
    if ua.contains("mobile") {
        return DeviceType::Mobile;
    }
    // Android without the "mobile" token is a tablet.
    if ua.contains("tablet") || ua.contains("ipad") || ua.contains("android") {
        return DeviceType::Tablet;
    }
    if ua.contains("windows") || ua.contains("mac os x") || ua.contains("linux") {
        return DeviceType::Desktop;
    }
    DeviceType::Unknown
}

fn first_forwarded_entry(forwarded_for: &str) -> Option<String> {
    forwarded_for
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Classify a request's client.
///
/// `forwarded_for` is the raw `X-Forwarded-For` chain, `real_ip` an
/// `X-Real-IP` style header, `remote_addr` the direct connection address.
/// The first available source wins; with none, the address is "Unknown".
pub fn classify(
    user_agent: &str,
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote_addr: Option<&str>,
) -> DeviceFingerprint {
    let ua = user_agent.to_lowercase();

    let ip_address = forwarded_for
        .and_then(first_forwarded_entry)
        .or_else(|| {
            real_ip
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            remote_addr
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown".to_string());

    DeviceFingerprint {
        user_agent: user_agent.to_string(),
        ip_address,
        browser: detect_browser(&ua),
        os: detect_os(&ua),
        device_type: detect_device_type(&ua),
    }
}
