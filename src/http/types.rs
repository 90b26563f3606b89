use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP request headers - case-insensitive key lookup
#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    headers: HashMap<String, String>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        HttpHeaders {
            headers: HashMap::new(),
        }
    }

    /// Add a header (key-value pair)
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.insert(key.into().to_lowercase(), value.into());
    }

    /// Get a header value (case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.headers.contains_key(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.headers.iter()
    }
}

/// HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Request target as received, query string included
    pub uri: String,
    pub http_version: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Parameters captured by the route currently handling the request
    pub params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(
        method: HttpMethod,
        uri: String,
        http_version: String,
        headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Self {
        HttpRequest {
            method,
            uri,
            http_version,
            headers,
            body,
            params: HashMap::new(),
        }
    }

    /// A bodiless HTTP/1.1 request, handy for dispatching without a socket.
    pub fn bare(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self::new(
            method,
            uri.into(),
            "HTTP/1.1".to_string(),
            HttpHeaders::new(),
            Vec::new(),
        )
    }

    /// The path component of the request target.
    pub fn path(&self) -> &str {
        let end = self.uri.find(|c: char| c == '?' || c == '#').unwrap_or(self.uri.len());
        &self.uri[..end]
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        let (_, rest) = self.uri.split_once('?')?;
        Some(rest.split('#').next().unwrap_or(rest))
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Canonical reason phrase for the status codes this crate emits.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// HTTP response
///
/// Handlers receive a pending response; one that has been sent is what stops
/// a well-behaved handler from also calling its continuation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub http_version: String,
    pub status: u16,
    pub reason_phrase: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    sent: bool,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        reason_phrase: impl Into<String>,
        headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Self {
        HttpResponse {
            http_version: "HTTP/1.1".to_string(),
            status,
            reason_phrase: reason_phrase.into(),
            headers,
            body,
            sent: false,
        }
    }

    /// A response nothing has written to yet.
    pub fn pending() -> Self {
        Self::new(404, "Not Found", HttpHeaders::new(), Vec::new())
    }

    pub fn not_found() -> Self {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Length", "0");
        Self::new(404, "Not Found", headers, Vec::new())
    }

    /// Write status, content type and body, and mark the response as sent.
    pub fn send(&mut self, status: u16, content_type: &str, body: impl Into<Vec<u8>>) {
        self.status = status;
        self.reason_phrase = reason_phrase(status).to_string();
        self.body = body.into();
        self.headers.insert("Content-Type", content_type);
        self.headers.insert("Content-Length", self.body.len().to_string());
        self.sent = true;
    }

    pub fn text(&mut self, body: impl Into<String>) {
        let body: String = body.into();
        self.send(200, "text/plain", body);
    }

    /// 302 to `location`.
    pub fn redirect(&mut self, location: &str) {
        self.headers.insert("Location", location);
        self.send(302, "text/plain", Vec::new());
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Format the status line and headers as bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut result = format!(
            "{} {} {}\r\n",
            self.http_version, self.status, self.reason_phrase
        );

        // Sort headers for deterministic output
        let mut headers: Vec<_> = self.headers.iter().collect();
        headers.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in headers {
            result.push_str(&format!("{}: {}\r\n", key, value));
        }

        result.push_str("\r\n");
        result.into_bytes()
    }

    /// Combine headers and body into complete response
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut response = self.serialize();
        response.extend_from_slice(&self.body);
        response
    }
}
