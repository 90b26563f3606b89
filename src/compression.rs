use std::io::{Result as IoResult, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::{HttpRequest, HttpResponse};

/// Compress data using gzip
pub fn gzip_encode(data: &[u8]) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = GzEncoder::new(&mut buffer, Compression::default());
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(buffer)
}

fn accepts_gzip(request: &HttpRequest) -> bool {
    request
        .headers
        .get("Accept-Encoding")
        .map(|value| value.split(',').any(|e| e.trim() == "gzip"))
        .unwrap_or(false)
}

/// Gzip a sent response body when the client accepts it.
///
/// Empty bodies and already-encoded responses are left alone, as is the
/// body when compression fails.
pub fn negotiate(request: &HttpRequest, response: &mut HttpResponse) {
    if response.body.is_empty()
        || response.headers.contains("Content-Encoding")
        || !accepts_gzip(request)
    {
        return;
    }

    match gzip_encode(&response.body) {
        Ok(compressed) => {
            response.body = compressed;
            response.headers.insert("Content-Encoding", "gzip");
            response
                .headers
                .insert("Content-Length", response.body.len().to_string());
        }
        Err(e) => log::warn!("Failed to gzip response body: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpHeaders, HttpMethod};

    fn request_accepting(encoding: &str) -> HttpRequest {
        let mut headers = HttpHeaders::new();
        headers.insert("Accept-Encoding", encoding);
        HttpRequest::new(
            HttpMethod::Get,
            "/".to_string(),
            "HTTP/1.1".to_string(),
            headers,
            Vec::new(),
        )
    }

    #[test]
    fn test_gzip_encode_basic() {
        let compressed = gzip_encode(b"Hello, World!").unwrap();

        // Should have gzip magic number (1f 8b)
        assert_eq!(compressed[0], 0x1f);
        assert_eq!(compressed[1], 0x8b);
    }

    #[test]
    fn test_negotiate_compresses_when_accepted() {
        let mut response = HttpResponse::pending();
        response.text("hello");

        negotiate(&request_accepting("deflate, gzip"), &mut response);

        assert_eq!(response.headers.get("Content-Encoding"), Some("gzip"));
        assert_eq!(
            response.headers.get("Content-Length"),
            Some(response.body.len().to_string().as_str())
        );
        assert_ne!(response.body, b"hello");
    }

    #[test]
    fn test_negotiate_skips_when_not_accepted() {
        let mut response = HttpResponse::pending();
        response.text("plain");

        negotiate(&request_accepting("deflate"), &mut response);

        assert_eq!(response.body, b"plain");
        assert_eq!(response.headers.get("Content-Encoding"), None);
    }

    #[test]
    fn test_negotiate_skips_empty_body() {
        let mut response = HttpResponse::not_found();
        negotiate(&request_accepting("gzip"), &mut response);
        assert!(response.body.is_empty());
    }
}
