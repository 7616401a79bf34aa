//! Userstyle service URLs and the download request rules
//!
//! userstyles.org rejects very long GET queries, so requests to it are
//! rewritten before sending: the query moves into a POST body, and long
//! query values of JSON style requests are collapsed into numbered
//! markers that [`PreparedRequest::expand_response`] puts back into the
//! returned style code.

use crate::error::UrlError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const USO: &str = "https://userstyles.org/";
pub const USO_API: &str = "https://gateway.userstyles.org/styles/getStyle";
pub const USO_JSON: &str = "https://userstyles.org/styles/chrome/";
pub const USOA: &str = "https://uso.kkx.one/";
pub const USW: &str = "https://userstyles.world/";

/// Mirrors of the userstyles.org archive, preferred first
pub const USOA_RAW: [&str; 4] = [
    "https://cdn.jsdelivr.net/gh/uso-archive/data@flomaster/data/",
    "https://raw.githubusercontent.com/uso-archive/data/flomaster/data/",
    "https://cdn.jsdelivr.net/gh/33kk/uso-archive@flomaster/data/",
    "https://raw.githubusercontent.com/33kk/uso-archive/flomaster/data/",
];

/// Query values shorter than this are never collapsed
const MIN_COLLAPSED_LEN: usize = 10;
/// URLs shorter than this are sent as is
const MIN_COLLAPSE_URL_LEN: usize = 2000;

static USER_CSS_ID_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)\.user\.css").unwrap());
static GREASYFORK_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https://)(?:update\.)?((?:greasy|sleazy)fork\.org/scripts/)(\d+)[^/]*/code/[^/]*\.user\.css$",
    )
    .unwrap()
});
static LOCALHOST_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^file:|^https?://([^/]+@)?(localhost|127\.0\.0\.1)(:\d+)?/").unwrap()
});
static VAR_MARKER_RX: Lazy<Regex> = Lazy::new(|| Regex::new("\x01(\\d+)\x02").unwrap());

/// Userstyle hosting services with their own install pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Usoa,
    Usw,
    GreasyFork,
}

/// Where a style comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSource<'a> {
    /// A known service and the style id on it
    Named(Service, u64),
    /// A raw update URL
    Url(&'a str),
}

/// Style id of a URL on one of the archive mirrors
pub fn extract_usoa_id(url: &str) -> Option<u64> {
    if USOA_RAW.iter().any(|mirror| url.starts_with(mirror)) {
        user_css_id(url)
    } else {
        None
    }
}

/// Style id of a userstyles.world URL
pub fn extract_usw_id(url: &str) -> Option<u64> {
    if url.starts_with(USW) {
        user_css_id(url)
    } else {
        None
    }
}

fn user_css_id(url: &str) -> Option<u64> {
    USER_CSS_ID_RX
        .captures(url)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|&id: &u64| id != 0)
}

/// Scheme, script path and id of a greasyfork or sleazyfork code URL
pub fn greasyfork_parts(url: &str) -> Option<(&str, &str, &str)> {
    let caps = GREASYFORK_RX.captures(url)?;
    Some((
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3)?.as_str(),
    ))
}

/// Human facing page of a style
pub fn make_install_url(source: StyleSource<'_>) -> Option<String> {
    match source {
        StyleSource::Named(Service::Usoa, id) => Some(format!("{USOA}style/{id}")),
        StyleSource::Named(Service::Usw, id) => Some(format!("{USW}style/{id}")),
        StyleSource::Named(Service::GreasyFork, id) => {
            Some(format!("https://greasyfork.org/scripts/{id}"))
        }
        StyleSource::Url(url) => {
            if let Some(id) = extract_usoa_id(url) {
                make_install_url(StyleSource::Named(Service::Usoa, id))
            } else if let Some(id) = extract_usw_id(url) {
                make_install_url(StyleSource::Named(Service::Usw, id))
            } else {
                greasyfork_parts(url).map(|(scheme, path, id)| format!("{scheme}{path}{id}"))
            }
        }
    }
}

/// Machine facing update URL of a style
pub fn make_update_url(source: StyleSource<'_>) -> Option<String> {
    match source {
        StyleSource::Named(Service::Usoa, id) => {
            Some(format!("{}usercss/{id}.user.css", USOA_RAW[0]))
        }
        StyleSource::Named(Service::Usw, id) => Some(format!("{USW}api/style/{id}.user.css")),
        StyleSource::Named(Service::GreasyFork, _) => None,
        StyleSource::Url(url) => {
            if let Some(id) = extract_usoa_id(url) {
                make_update_url(StyleSource::Named(Service::Usoa, id))
            } else {
                extract_usw_id(url).and_then(|id| make_update_url(StyleSource::Named(Service::Usw, id)))
            }
        }
    }
}

/// Check whether styles may be applied to `url`
///
/// Extension pages of our own origin are only supported with `allow_own`.
pub fn is_supported(url: &str, own_origin: &str, allow_own: bool) -> bool {
    ["http", "ftp", "file"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
        || (allow_own && !own_origin.is_empty() && url.starts_with(own_origin))
}

/// Check whether `url` points at a local file or server
pub fn is_localhost(url: &str) -> bool {
    LOCALHOST_RX.is_match(url)
}

/// Favicon service URL for `host`
pub fn favicon_url(host: &str) -> String {
    format!("https://icons.duckduckgo.com/ip3/{host}.ico")
}

/// Whether a response status satisfies the request
///
/// `file:` URLs carry no meaningful status, and `required` 0 accepts any.
pub fn status_accepted(status: u16, required: u16, url: &Url) -> bool {
    status == required || required == 0 || url.scheme() == "file"
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Text,
    Json,
    ArrayBuffer,
    Blob,
}

/// A download as requested by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
    pub response_type: ResponseType,
    /// Expected status, 0 for any
    pub required_status: u16,
    /// Time allowed until response headers arrive
    pub timeout: Duration,
    /// Time allowed for the whole body
    pub load_timeout: Duration,
}

impl DownloadRequest {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(120);

    /// GET `url` as text, expecting status 200
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            headers: None,
            response_type: ResponseType::Text,
            required_status: 200,
            timeout: Self::DEFAULT_TIMEOUT,
            load_timeout: Self::DEFAULT_LOAD_TIMEOUT,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn required_status(mut self, status: u16) -> Self {
        self.required_status = status;
        self
    }

    /// Apply the userstyles.org rewrites and parse the final URL
    pub fn prepare(self) -> Result<PreparedRequest, UrlError> {
        let Self {
            mut url,
            mut method,
            mut body,
            mut headers,
            response_type,
            required_status,
            timeout,
            load_timeout,
        } = self;

        let query_pos = if url.starts_with(USO) { url.find('?') } else { None };
        if let Some(pos) = query_pos {
            if body.is_none() {
                method = Method::Post;
                body = Some(url[pos..].to_string());
                url.truncate(pos);
            }
            if headers.is_none() {
                headers = Some(vec![(
                    "Content-type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                )]);
            }
        }

        let (request_url, vars) = collapse_uso_vars(&url, method);
        if !vars.is_empty() {
            debug!(count = vars.len(), "collapsed long query values");
        }
        let request_url = Url::parse(&request_url).map_err(|source| UrlError::Invalid {
            url: request_url.clone(),
            source,
        })?;

        Ok(PreparedRequest {
            url: request_url,
            update_url: url,
            method,
            body,
            headers: headers.unwrap_or_default(),
            response_type,
            required_status,
            timeout,
            load_timeout,
            vars,
        })
    }
}

/// A request ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: Url,
    /// URL before long query values were collapsed
    pub update_url: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    pub required_status: u16,
    pub timeout: Duration,
    pub load_timeout: Duration,
    /// Collapsed query values; marker N refers to `vars[N - 1]`
    pub vars: Vec<String>,
}

impl PreparedRequest {
    pub fn status_accepted(&self, status: u16) -> bool {
        status_accepted(status, self.required_status, &self.url)
    }

    /// Restore collapsed values in a JSON style response
    ///
    /// Responses that are not JSON objects are returned unchanged.
    pub fn expand_response<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.vars.is_empty() || text.is_empty() {
            return Cow::Borrowed(text);
        }
        let mut json = match serde_json::from_str::<Value>(text) {
            Ok(json @ Value::Object(_)) => json,
            _ => {
                warn!(url = %self.url, "response with collapsed values is not a JSON object");
                return Cow::Borrowed(text);
            }
        };

        json["updateUrl"] = Value::String(self.update_url.clone());
        if let Some(sections) = json.get_mut("sections").and_then(Value::as_array_mut) {
            for section in sections {
                if let Some(code) = section.get_mut("code") {
                    if let Some(text) = code.as_str() {
                        *code = Value::String(self.expand_markers(text));
                    }
                }
            }
        }
        Cow::Owned(json.to_string())
    }

    fn expand_markers(&self, code: &str) -> String {
        VAR_MARKER_RX
            .replace_all(code, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.vars.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Replace long query values of a userstyles.org JSON GET with markers
fn collapse_uso_vars(url: &str, method: Method) -> (String, Vec<String>) {
    let Some(pos) = url.find('?') else {
        return (url.to_string(), Vec::new());
    };
    if url.len() < MIN_COLLAPSE_URL_LEN || !url.starts_with(USO_JSON) || method != Method::Get {
        return (url.to_string(), Vec::new());
    }

    let mut vars = Vec::new();
    let params: Vec<(String, String)> = url::form_urlencoded::parse(url[pos + 1..].as_bytes())
        .into_owned()
        .map(|(key, value)| {
            if value.len() < MIN_COLLAPSED_LEN || value.starts_with("ik-") {
                (key, value)
            } else {
                vars.push(value);
                (key, format!("\x01{}\x02", vars.len()))
            }
        })
        .collect();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    (format!("{}{query}", &url[..=pos]), vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_ids() {
        let usoa = format!("{}usercss/12345.user.css", USOA_RAW[1]);
        assert_eq!(extract_usoa_id(&usoa), Some(12345));
        assert_eq!(extract_usw_id(&usoa), None);

        assert_eq!(extract_usw_id("https://userstyles.world/api/style/77.user.css"), Some(77));
        assert_eq!(extract_usoa_id("https://example.com/usercss/1.user.css"), None);
    }

    #[test]
    fn test_install_and_update_urls() {
        let update = make_update_url(StyleSource::Named(Service::Usoa, 42)).unwrap();
        assert_eq!(
            update,
            "https://cdn.jsdelivr.net/gh/uso-archive/data@flomaster/data/usercss/42.user.css"
        );
        assert_eq!(
            make_install_url(StyleSource::Url(&update)).as_deref(),
            Some("https://uso.kkx.one/style/42")
        );
        assert_eq!(
            make_update_url(StyleSource::Url("https://userstyles.world/style/9")),
            None
        );
        assert_eq!(
            make_update_url(StyleSource::Named(Service::Usw, 9)).as_deref(),
            Some("https://userstyles.world/api/style/9.user.css")
        );

        let gf = "https://update.greasyfork.org/scripts/4321-dark/code/dark.user.css";
        assert_eq!(greasyfork_parts(gf), Some(("https://", "greasyfork.org/scripts/", "4321")));
        assert_eq!(
            make_install_url(StyleSource::Url(gf)).as_deref(),
            Some("https://greasyfork.org/scripts/4321")
        );
        assert_eq!(make_install_url(StyleSource::Url("https://example.com/")), None);
    }

    #[test]
    fn test_supported_and_localhost() {
        let own = "chrome-extension://abcdef/";
        assert!(is_supported("https://example.com/", own, false));
        assert!(is_supported("file:///tmp/a.css", own, false));
        assert!(!is_supported("chrome://settings", own, true));
        assert!(!is_supported("chrome-extension://abcdef/manage.html", own, false));
        assert!(is_supported("chrome-extension://abcdef/manage.html", own, true));

        assert!(is_localhost("file:///home/me/style.user.css"));
        assert!(is_localhost("http://user@localhost:8080/x.user.css"));
        assert!(is_localhost("https://127.0.0.1/"));
        assert!(!is_localhost("https://localhost.example.com/"));

        assert_eq!(favicon_url("example.com"), "https://icons.duckduckgo.com/ip3/example.com.ico");
    }

    #[test]
    fn test_plain_request_keeps_defaults() {
        let req = DownloadRequest::new("https://example.com/a.user.css?x=1")
            .prepare()
            .unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.body, None);
        assert!(req.headers.is_empty());
        assert_eq!(req.required_status, 200);
        assert_eq!(req.timeout, Duration::from_secs(60));
        assert_eq!(req.load_timeout, Duration::from_secs(120));
        assert!(req.status_accepted(200));
        assert!(!req.status_accepted(404));
    }

    #[test]
    fn test_uso_query_moves_into_post_body() {
        let req = DownloadRequest::new("https://userstyles.org/styles/chrome/1.json?ik-a=1")
            .prepare()
            .unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some("?ik-a=1"));
        assert_eq!(req.url.as_str(), "https://userstyles.org/styles/chrome/1.json");
        assert_eq!(
            req.headers,
            vec![(
                "Content-type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )]
        );
        assert!(req.vars.is_empty());
    }

    #[test]
    fn test_long_uso_get_collapses_and_expands() {
        let long = "c".repeat(2100);
        let raw = format!("{USO_JSON}5.json?short=abc&keep=ik-0123456789ab&color={long}");
        let req = DownloadRequest::new(raw.clone())
            .body("")
            .header("Accept", "application/json")
            .prepare()
            .unwrap();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.vars, vec![long.clone()]);
        assert_eq!(
            req.url.as_str(),
            format!("{USO_JSON}5.json?short=abc&keep=ik-0123456789ab&color=%011%02")
        );

        let response = json!({
            "name": "x",
            "sections": [{"code": "a { color: \u{1}1\u{2}; }"}, {"code": "b{}"}]
        })
        .to_string();
        let expanded: Value = serde_json::from_str(&req.expand_response(&response)).unwrap();
        assert_eq!(expanded["updateUrl"], json!(raw));
        assert_eq!(expanded["sections"][0]["code"], json!(format!("a {{ color: {long}; }}")));
        assert_eq!(expanded["sections"][1]["code"], json!("b{}"));
    }

    #[test]
    fn test_expand_without_vars_is_identity() {
        let req = DownloadRequest::new("https://example.com/x").prepare().unwrap();
        assert!(matches!(req.expand_response("{\"a\":1}"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_status_rules() {
        let file = Url::parse("file:///tmp/x.css").unwrap();
        let http = Url::parse("https://example.com/").unwrap();
        assert!(status_accepted(0, 200, &file));
        assert!(status_accepted(500, 0, &http));
        assert!(!status_accepted(500, 200, &http));
    }

    #[test]
    fn test_invalid_url() {
        let err = DownloadRequest::new("not a url").prepare().unwrap_err();
        assert!(matches!(err, UrlError::Invalid { .. }));
    }
}
