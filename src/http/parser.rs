use std::io::{BufRead, Error, ErrorKind};
use std::str::FromStr;

use crate::http::types::{HttpHeaders, HttpMethod, HttpRequest};

/// Parse a single HTTP request line
fn parse_request_line(line: &str) -> Result<(HttpMethod, String, String), Error> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() < 3 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Malformed HTTP request line: '{}'", line.trim_end()),
        ));
    }

    let method = HttpMethod::from_str(parts[0])
        .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;

    Ok((method, parts[1].to_string(), parts[2].to_string()))
}

fn parse_headers<R: BufRead>(reader: &mut R) -> Result<HttpHeaders, Error> {
    let mut headers = HttpHeaders::new();
    let mut line = String::new();

    loop {
        line.clear();
        reader.read_line(&mut line)?;

        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Malformed HTTP header: '{}'", line.trim_end()),
            )
        })?;

        headers.insert(key.trim(), value.trim());
    }

    Ok(headers)
}

/// Get the Content-Length from headers, defaults to 0 if not present
fn get_content_length(headers: &HttpHeaders) -> Result<usize, Error> {
    match headers.get("Content-Length") {
        Some(value) => value.parse::<usize>().map_err(|_| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Invalid Content-Length value: '{}'", value),
            )
        }),
        None => Ok(0),
    }
}

/// Parse the next request from a connection.
///
/// Returns `Ok(None)` when the peer closed the connection before sending a
/// request line, which is how a persistent connection ends.
pub fn parse_request<R: BufRead>(reader: &mut R) -> Result<Option<HttpRequest>, Error> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }

    let (method, uri, http_version) = parse_request_line(&request_line)?;
    let headers = parse_headers(reader)?;

    let content_length = get_content_length(&headers)?;
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    Ok(Some(HttpRequest::new(method, uri, http_version, headers, body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_request_line_valid() {
        let (method, uri, version) = parse_request_line("GET /users/42 HTTP/1.1\r\n").unwrap();
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(uri, "/users/42");
        assert_eq!(version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_request_line_invalid() {
        assert!(parse_request_line("GET /index.html").is_err());
        assert!(parse_request_line("INVALID /path HTTP/1.1").is_err());
    }

    #[test]
    fn test_get_content_length_invalid() {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Length", "not-a-number");
        assert!(get_content_length(&headers).is_err());
    }

    #[test]
    fn test_parse_full_request() {
        let raw = "POST /noNamePost HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let mut reader = Cursor::new(raw.as_bytes());

        let request = parse_request(&mut reader).unwrap().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path(), "/noNamePost");
        assert_eq!(request.headers.get("host"), Some("localhost"));
        assert_eq!(request.body, b"hello");
    }

    #[test]
    fn test_parse_request_at_eof() {
        let mut reader = Cursor::new(&b""[..]);
        assert!(parse_request(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_parse_pipelined_requests() {
        let raw = "GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
        let mut reader = Cursor::new(raw.as_bytes());

        let first = parse_request(&mut reader).unwrap().unwrap();
        let second = parse_request(&mut reader).unwrap().unwrap();
        assert_eq!(first.uri, "/a");
        assert_eq!(second.uri, "/b");
        assert!(parse_request(&mut reader).unwrap().is_none());
    }
}
