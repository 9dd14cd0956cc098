//! HTTP request wrapper.
//!
//! A [`Request`] owns everything a handler needs: the raw HTTP parts, the parsed
//! query/form/JSON parameters, cookies and uploaded files. Parsing happens once
//! at construction; accessors never fail.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{LazyLock, OnceLock};

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, Method, Uri, Version};
use serde_json::Value;

use super::params::{parse_cookies, parse_urlencoded, Params};
use crate::support::arr;

/// Methods a POST may be rewritten to via `_method` or the override header.
const SPOOFABLE_METHODS: [Method; 3] = [Method::PUT, Method::PATCH, Method::DELETE];

static X_HTTP_METHOD_OVERRIDE: LazyLock<HeaderName> =
    LazyLock::new(|| HeaderName::from_static("x-http-method-override"));
static X_FORWARDED_PROTO: LazyLock<HeaderName> =
    LazyLock::new(|| HeaderName::from_static("x-forwarded-proto"));
static X_FORWARDED_FOR: LazyLock<HeaderName> =
    LazyLock::new(|| HeaderName::from_static("x-forwarded-for"));
static CLIENT_IP: LazyLock<HeaderName> = LazyLock::new(|| HeaderName::from_static("client-ip"));

/// A file received in a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-side file name.
    pub name: String,
    /// MIME type announced by the client.
    pub mime_type: String,
    /// Where the content was stored; empty when the upload was rejected.
    pub tmp_name: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// 0 on success, otherwise an upload error code (1 = too large).
    pub error: u8,
}

impl UploadedFile {
    /// Upload rejected because it exceeded the size limit.
    pub const ERR_TOO_LARGE: u8 = 1;

    /// Check if the upload succeeded and the stored file still exists.
    pub fn is_valid(&self) -> bool {
        self.error == 0 && !self.tmp_name.as_os_str().is_empty() && self.tmp_name.is_file()
    }
}

/// HTTP request.
///
/// Note: Clone is intentionally not derived; requests move through the
/// middleware chain and into the handler.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    secure: bool,
    server_name: Option<String>,
    query: Params,
    post: Params,
    input: Params,
    cookies: Params,
    files: HashMap<String, Vec<UploadedFile>>,
    all: OnceLock<Params>,
}

impl Request {
    /// Create a request and parse query, cookies and (non-multipart) body.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = uri.query().map(parse_urlencoded).unwrap_or_default();
        let cookies = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(parse_cookies)
            .unwrap_or_default();

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let post = if method == Method::POST
            && content_type.starts_with("application/x-www-form-urlencoded")
        {
            parse_urlencoded(&String::from_utf8_lossy(&body))
        } else {
            Params::new()
        };

        let input = parse_input(&method, &content_type, &body);

        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
            remote_addr: None,
            secure: false,
            server_name: None,
            query,
            post,
            input,
            cookies,
            files: HashMap::new(),
            all: OnceLock::new(),
        }
    }

    /// Set the peer address.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Mark the transport as HTTPS.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Fallback host name for [`full_url`](Self::full_url).
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Set the HTTP version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Attach fields and files decoded from a multipart body.
    pub fn with_multipart(mut self, fields: Params, files: HashMap<String, Vec<UploadedFile>>) -> Self {
        if self.method == Method::POST {
            self.post.extend(fields);
            self.files = files;
        }
        self.all = OnceLock::new();
        self
    }

    // Method

    /// Effective method, honouring POST method spoofing.
    pub fn method(&self) -> Method {
        if self.method == Method::POST {
            let spoofed = self
                .post
                .get("_method")
                .and_then(Value::as_str)
                .or_else(|| self.header_by_name(&X_HTTP_METHOD_OVERRIDE))
                .map(|s| s.trim().to_ascii_uppercase())
                .and_then(|s| Method::from_bytes(s.as_bytes()).ok());

            if let Some(method) = spoofed {
                if SPOOFABLE_METHODS.contains(&method) {
                    return method;
                }
            }
        }
        self.method.clone()
    }

    /// Method as sent on the wire.
    #[inline]
    pub fn real_method(&self) -> &Method {
        &self.method
    }

    /// Case-insensitive comparison against the effective method.
    pub fn is_method(&self, method: &str) -> bool {
        self.method().as_str().eq_ignore_ascii_case(method)
    }

    pub fn is_get(&self) -> bool {
        self.is_method("GET")
    }

    pub fn is_post(&self) -> bool {
        self.is_method("POST")
    }

    pub fn is_put(&self) -> bool {
        self.is_method("PUT")
    }

    pub fn is_patch(&self) -> bool {
        self.is_method("PATCH")
    }

    pub fn is_delete(&self) -> bool {
        self.is_method("DELETE")
    }

    pub fn is_head(&self) -> bool {
        self.is_method("HEAD")
    }

    pub fn is_options(&self) -> bool {
        self.is_method("OPTIONS")
    }

    // URI

    /// Path without trailing slashes; the root is always `/`.
    pub fn path_info(&self) -> &str {
        let trimmed = self.uri.path().trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }

    /// Get the request path as sent.
    #[inline]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the raw query string.
    #[inline]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get the full URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the HTTP version.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// `scheme://host/path?query`.
    pub fn full_url(&self) -> String {
        let scheme = if self.is_secure() { "https" } else { "http" };
        let host = self
            .header_by_name(&header::HOST)
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
            .or(self.server_name.as_deref())
            .unwrap_or("localhost");
        let path = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        format!("{}://{}{}", scheme, host, path)
    }

    // Headers

    #[inline]
    fn header_by_name(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a header value (case-insensitive).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get User-Agent header.
    #[inline]
    pub fn user_agent(&self) -> Option<&str> {
        self.header_by_name(&header::USER_AGENT)
    }

    /// Get Content-Type header.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.header_by_name(&header::CONTENT_TYPE)
    }

    /// Content-Type mentions JSON.
    pub fn is_json(&self) -> bool {
        self.content_type().map(|v| v.contains("json")).unwrap_or(false)
    }

    /// Accept mentions JSON.
    pub fn wants_json(&self) -> bool {
        self.header_by_name(&header::ACCEPT)
            .map(|v| v.contains("json"))
            .unwrap_or(false)
    }

    /// Check if client accepts HTML responses (text/html, text/*, */*).
    pub fn accepts_html(&self) -> bool {
        self.header_by_name(&header::ACCEPT)
            .map(|v| v.contains("text/html") || v.contains("*/*") || v.contains("text/*"))
            .unwrap_or(false)
    }

    /// HTTPS transport or a proxy reporting https.
    pub fn is_secure(&self) -> bool {
        self.secure
            || self
                .header_by_name(&X_FORWARDED_PROTO)
                .map(|v| v.eq_ignore_ascii_case("https"))
                .unwrap_or(false)
    }

    /// Client IP: `Client-IP`, then first `X-Forwarded-For` hop, then peer.
    pub fn ip(&self) -> String {
        let raw = self
            .header_by_name(&CLIENT_IP)
            .or_else(|| self.header_by_name(&X_FORWARDED_FOR))
            .map(str::to_string)
            .or_else(|| self.remote_addr.map(|a| a.ip().to_string()))
            .unwrap_or_default();

        raw.split(',').next().unwrap_or("").trim().to_string()
    }

    /// Peer socket address, when known.
    #[inline]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    // Parameters

    /// Look up a key in query, then post, then input.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.query
            .get(key)
            .or_else(|| self.post.get(key))
            .or_else(|| self.input.get(key))
    }

    /// Like [`get`](Self::get), as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Key present in query, post or input.
    pub fn has(&self, key: &str) -> bool {
        self.query.contains_key(key) || self.post.contains_key(key) || self.input.contains_key(key)
    }

    /// Body parameter: post, then JSON/url-encoded input. Ignores the query.
    pub fn input(&self, key: &str) -> Option<&Value> {
        self.post.get(key).or_else(|| self.input.get(key))
    }

    pub fn query(&self, key: &str) -> Option<&Value> {
        self.query.get(key)
    }

    pub fn post(&self, key: &str) -> Option<&Value> {
        self.post.get(key)
    }

    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).and_then(Value::as_str)
    }

    /// All cookies.
    pub fn cookies(&self) -> &Params {
        &self.cookies
    }

    /// First uploaded file for a field.
    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.files.get(key).and_then(|f| f.first())
    }

    /// Field has a successfully stored upload.
    pub fn has_file(&self, key: &str) -> bool {
        self.file(key).map(UploadedFile::is_valid).unwrap_or(false)
    }

    pub fn all_files(&self) -> &HashMap<String, Vec<UploadedFile>> {
        &self.files
    }

    /// Query, post and input merged; later sources override earlier ones.
    pub fn all(&self) -> &Params {
        self.all.get_or_init(|| {
            let mut merged = self.query.clone();
            merged.extend(self.post.clone());
            merged.extend(self.input.clone());
            merged
        })
    }

    /// Subset of [`all`](Self::all) with the given (dot) keys.
    pub fn only(&self, keys: &[&str]) -> Params {
        let all = Value::Object(self.all().clone());
        match arr::only(&all, keys) {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    /// [`all`](Self::all) without the given (dot) keys.
    pub fn except(&self, keys: &[&str]) -> Params {
        let all = Value::Object(self.all().clone());
        match arr::except(&all, keys) {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    /// Body decoded as a JSON object; empty when it is not one.
    pub fn json(&self) -> Params {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => map,
            _ => Params::new(),
        }
    }

    /// Get the raw request body.
    #[inline]
    pub fn raw_input(&self) -> &Bytes {
        &self.body
    }
}

/// Decode the non-form body into input parameters.
fn parse_input(method: &Method, content_type: &str, body: &Bytes) -> Params {
    if body.is_empty() {
        return Params::new();
    }

    if content_type.contains("json") {
        return match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Params::new(),
        };
    }

    if *method != Method::GET && *method != Method::POST && !content_type.starts_with("multipart/") {
        return parse_urlencoded(&String::from_utf8_lossy(body));
    }

    Params::new()
}

impl<B> From<http::Request<B>> for Request
where
    B: Into<Bytes>,
{
    fn from(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        Request::new(parts.method, parts.uri, parts.headers, body.into()).with_version(parts.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(method: &str, uri: &str, headers: &[(&str, &str)], body: &str) -> Request {
        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        Request::from(builder.body(Bytes::from(body.to_string())).unwrap())
    }

    #[test]
    fn test_query_and_path_info() {
        let req = build("GET", "/users/?page=2&sort=name", &[], "");
        assert_eq!(req.path_info(), "/users");
        assert_eq!(req.query("page"), Some(&json!("2")));
        assert_eq!(req.get_str("sort"), Some("name"));

        let root = build("GET", "/", &[], "");
        assert_eq!(root.path_info(), "/");
        let slashes = build("GET", "///", &[], "");
        assert_eq!(slashes.path_info(), "/");
    }

    #[test]
    fn test_form_post() {
        let req = build(
            "POST",
            "/login?next=/home",
            &[("content-type", "application/x-www-form-urlencoded")],
            "email=a%40b.c&remember=1",
        );
        assert_eq!(req.post("email"), Some(&json!("a@b.c")));
        assert_eq!(req.input("remember"), Some(&json!("1")));
        assert!(req.input("next").is_none());
        assert!(req.has("next"));
        assert!(req.is_post());
    }

    #[test]
    fn test_method_spoofing() {
        let req = build(
            "POST",
            "/posts/1",
            &[("content-type", "application/x-www-form-urlencoded")],
            "_method=delete",
        );
        assert_eq!(req.method(), Method::DELETE);
        assert!(req.is_delete());
        assert_eq!(req.real_method(), &Method::POST);

        let header = build("POST", "/posts/1", &[("x-http-method-override", "patch")], "");
        assert_eq!(header.method(), Method::PATCH);

        // GET is not spoofable
        let ignored = build(
            "POST",
            "/",
            &[("content-type", "application/x-www-form-urlencoded")],
            "_method=GET",
        );
        assert_eq!(ignored.method(), Method::POST);

        // Only POST may be spoofed
        let put = build("PUT", "/", &[("x-http-method-override", "DELETE")], "");
        assert_eq!(put.method(), Method::PUT);
    }

    #[test]
    fn test_json_body() {
        let req = build(
            "POST",
            "/api/items",
            &[("content-type", "application/json"), ("accept", "application/json")],
            r#"{"name":"widget","qty":3}"#,
        );
        assert!(req.is_json());
        assert!(req.wants_json());
        assert_eq!(req.input("qty"), Some(&json!(3)));
        assert_eq!(req.json().get("name"), Some(&json!("widget")));
        assert!(req.post("name").is_none());
    }

    #[test]
    fn test_invalid_json_is_empty() {
        let req = build("POST", "/", &[("content-type", "application/json")], "{oops");
        assert!(req.json().is_empty());
        assert!(req.all().is_empty());
    }

    #[test]
    fn test_urlencoded_body_on_put() {
        let req = build("PUT", "/items/1", &[], "name=new+name");
        assert_eq!(req.input("name"), Some(&json!("new name")));
        assert!(req.post("name").is_none());

        // GET bodies are ignored
        let get = build("GET", "/", &[], "a=1");
        assert!(!get.has("a"));
    }

    #[test]
    fn test_all_only_except() {
        let req = build(
            "POST",
            "/?a=1&b=2",
            &[("content-type", "application/x-www-form-urlencoded")],
            "b=3&c=4",
        );
        let all = req.all();
        assert_eq!(all["a"], json!("1"));
        assert_eq!(all["b"], json!("3"));
        assert_eq!(all["c"], json!("4"));

        let only = req.only(&["a", "c", "missing"]);
        assert_eq!(only.len(), 2);

        let except = req.except(&["a"]);
        assert!(!except.contains_key("a"));
        assert_eq!(except.len(), 2);
    }

    #[test]
    fn test_cookies_and_headers() {
        let req = build(
            "GET",
            "/",
            &[("cookie", "sid=xyz; lang=en"), ("user-agent", "test/1.0")],
            "",
        );
        assert_eq!(req.cookie("sid"), Some("xyz"));
        assert_eq!(req.cookie("missing"), None);
        assert_eq!(req.user_agent(), Some("test/1.0"));
        assert_eq!(req.header("User-Agent"), Some("test/1.0"));
    }

    #[test]
    fn test_ip_resolution() {
        let addr: SocketAddr = "10.0.0.9:5000".parse().unwrap();

        let direct = build("GET", "/", &[], "").with_remote_addr(addr);
        assert_eq!(direct.ip(), "10.0.0.9");

        let forwarded = build("GET", "/", &[("x-forwarded-for", "1.2.3.4, 10.0.0.1")], "")
            .with_remote_addr(addr);
        assert_eq!(forwarded.ip(), "1.2.3.4");

        let client = build(
            "GET",
            "/",
            &[("client-ip", "5.6.7.8"), ("x-forwarded-for", "1.2.3.4")],
            "",
        );
        assert_eq!(client.ip(), "5.6.7.8");

        assert_eq!(build("GET", "/", &[], "").ip(), "");
    }

    #[test]
    fn test_full_url_and_secure() {
        let req = build("GET", "/a?b=1", &[("host", "example.com")], "");
        assert_eq!(req.full_url(), "http://example.com/a?b=1");
        assert!(!req.is_secure());

        let proxied = build("GET", "/", &[("host", "example.com"), ("x-forwarded-proto", "https")], "");
        assert!(proxied.is_secure());
        assert_eq!(proxied.full_url(), "https://example.com/");

        let bare = build("GET", "/x", &[], "").with_server_name("app.local");
        assert_eq!(bare.full_url(), "http://app.local/x");

        let fallback = build("GET", "/x", &[], "").with_secure(true);
        assert_eq!(fallback.full_url(), "https://localhost/x");
    }

    #[test]
    fn test_multipart_only_for_post() {
        let mut files = HashMap::new();
        files.insert(
            "avatar".to_string(),
            vec![UploadedFile {
                name: "a.png".into(),
                mime_type: "image/png".into(),
                tmp_name: PathBuf::from("/nonexistent/upload"),
                size: 10,
                error: 0,
            }],
        );
        let mut fields = Params::new();
        fields.insert("title".into(), json!("hello"));

        let req = build("POST", "/upload", &[], "").with_multipart(fields.clone(), files.clone());
        assert_eq!(req.post("title"), Some(&json!("hello")));
        assert_eq!(req.file("avatar").map(|f| f.size), Some(10));
        // File is not on disk
        assert!(!req.has_file("avatar"));

        let put = build("PUT", "/upload", &[], "").with_multipart(fields, files);
        assert!(put.file("avatar").is_none());
    }

    #[test]
    fn test_has_file_on_disk() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut files = HashMap::new();
        files.insert(
            "doc".to_string(),
            vec![UploadedFile {
                name: "doc.txt".into(),
                mime_type: "text/plain".into(),
                tmp_name: tmp.path().to_path_buf(),
                size: 0,
                error: 0,
            }],
        );
        let req = build("POST", "/", &[], "").with_multipart(Params::new(), files);
        assert!(req.has_file("doc"));
        assert!(!req.has_file("other"));
    }
}
