use podbridge_api::{ByteRange, LogicalRange, RangeError};

use crate::error::CoreError;
use crate::paths::request_path_to_relative;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Head,
}

/// An immutable, already-validated request (component A). `path` is the
/// decoded, query-stripped path derived from `raw_url`.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub raw_url: String,
    pub version: String,
    pub path: String,
    headers: Vec<(String, String)>,
}

/// A small set of known podcast-client user-agent prefixes; broken-pipe
/// errors from these are logged at INFO rather than propagated (§4.3.6).
const KNOWN_PODCAST_AGENT_PREFIXES: &[&str] =
    &["Overcast", "Apple Podcasts", "Pocket Casts", "AntennaPod", "Podbridge"];

impl Request {
    /// Parses `METHOD SP URL SP VERSION` plus a sequence of already
    /// unfolded header lines (`name: value`). Rejects HTTP versions other
    /// than `HTTP/1.*` with 505, methods other than GET/HEAD with 405, and
    /// an empty URL or missing Host with 400.
    pub fn parse(request_line: &str, header_lines: &[String]) -> Result<Self, CoreError> {
        let mut parts = request_line.split(' ');
        let method_str = parts
            .next()
            .ok_or_else(|| CoreError::ClientRequest("empty request line".into()))?;
        let raw_url = parts
            .next()
            .ok_or_else(|| CoreError::ClientRequest("missing URL".into()))?
            .to_string();
        let version = parts
            .next()
            .ok_or_else(|| CoreError::ClientRequest("missing HTTP version".into()))?
            .to_string();

        if raw_url.is_empty() {
            return Err(CoreError::ClientRequest("empty URL".into()));
        }
        if !version.starts_with("HTTP/1.") {
            return Err(CoreError::VersionNotSupported);
        }
        let method = match method_str {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            _ => return Err(CoreError::MethodNotAllowed),
        };

        let headers = parse_headers(header_lines);
        let path = request_path_to_relative(&raw_url);

        let request = Request {
            method,
            raw_url,
            version,
            path,
            headers,
        };

        if request.host().is_none() {
            return Err(CoreError::ClientRequest("missing Host header".into()));
        }

        if let Some(expect) = request.header("Expect") {
            tracing::warn!(expect = %expect, "Expect header is not supported");
        }
        if let Some(if_range) = request.header("If-Range") {
            tracing::warn!(if_range = %if_range, "If-Range header is not supported");
        }

        Ok(request)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn host(&self) -> Option<&str> {
        self.header("Host")
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::Head
    }

    pub fn is_from_known_podcast_agent(&self) -> bool {
        match self.header("User-Agent") {
            Some(ua) => KNOWN_PODCAST_AGENT_PREFIXES
                .iter()
                .any(|prefix| ua.starts_with(prefix)),
            None => false,
        }
    }

    /// Parses the `Range` header into a physical `ByteRange`, or `None` if
    /// absent, unparsable-but-non-fatal, or resolved to "no range" per the
    /// table in §4.1. Returns an error only for hard failures (comma /
    /// multi-range, or both bounds negative).
    pub fn byte_range(&self, file_size: u64) -> Result<Option<ByteRange>, CoreError> {
        let Some(raw) = self.header("Range") else {
            return Ok(None);
        };
        let Some(logical) = parse_range_header(raw)? else {
            return Ok(None);
        };
        match logical.translate(file_size) {
            Ok(range) => Ok(range),
            Err(RangeError::NotSatisfiable) => Err(CoreError::RangeNotSatisfiable),
            Err(RangeError::Invalid) => Err(CoreError::Unsupported("invalid range".into())),
        }
    }

    /// Parses `If-Modified-Since` (RFC 1123). Unparsable values are logged
    /// and treated as absent (§4.2).
    pub fn if_modified_since(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = self.header("If-Modified-Since")?;
        match httpdate::parse_http_date(raw) {
            Ok(t) => Some(chrono::DateTime::<chrono::Utc>::from(t)),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "unparsable If-Modified-Since, treating as absent");
                None
            }
        }
    }
}

/// Parses the `Range` header string into a `LogicalRange`, applying the
/// edge cases enumerated in §4.1: must start with `bytes=`; exactly one
/// `-`; a comma is a hard error (multi-range unsupported); `start > end`
/// or `-0` or all-empty means "no range".
fn parse_range_header(raw: &str) -> Result<Option<LogicalRange>, CoreError> {
    let Some(spec) = raw.strip_prefix("bytes=") else {
        return Ok(None);
    };
    if spec.contains(',') {
        return Err(CoreError::Unsupported("multi-range requests are not supported".into()));
    }

    let dash_count = spec.matches('-').count();
    if dash_count != 1 {
        return Ok(None);
    }
    let dash_index = spec.find('-').unwrap();
    let (start_str, end_str) = (&spec[..dash_index], &spec[dash_index + 1..]);

    if start_str.is_empty() && end_str.is_empty() {
        return Ok(None);
    }

    let start: i64 = if start_str.is_empty() {
        -1
    } else {
        match start_str.parse() {
            Ok(n) => n,
            Err(_) => return Ok(None),
        }
    };
    let end: i64 = if end_str.is_empty() {
        -1
    } else {
        match end_str.parse() {
            Ok(n) => n,
            Err(_) => return Ok(None),
        }
    };

    if end == 0 && start < 0 {
        // `-0`: a zero-length suffix is treated as absent.
        return Ok(None);
    }
    if start >= 0 && end >= 0 && start > end {
        return Ok(None);
    }

    Ok(Some(LogicalRange { start, end }))
}

fn parse_headers(lines: &[String]) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in lines {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded continuation line: append to the previous value.
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        match line.split_once(':') {
            Some((name, value)) => headers.push((name.trim().to_string(), value.trim().to_string())),
            None => tracing::debug!(line = %line, "skipping unparsable header line"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(line: &str, headers: &[&str]) -> Result<Request, CoreError> {
        let lines: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        Request::parse(line, &lines)
    }

    #[test]
    fn rejects_http2() {
        let err = req("GET / HTTP/2", &["Host: x"]).unwrap_err();
        assert!(matches!(err, CoreError::VersionNotSupported));
    }

    #[test]
    fn rejects_bad_method() {
        let err = req("POST / HTTP/1.1", &["Host: x"]).unwrap_err();
        assert!(matches!(err, CoreError::MethodNotAllowed));
    }

    #[test]
    fn requires_host_header() {
        let err = req("GET / HTTP/1.1", &[]).unwrap_err();
        assert!(matches!(err, CoreError::ClientRequest(_)));
    }

    #[test]
    fn folds_continuation_lines() {
        let r = req(
            "GET / HTTP/1.1",
            &["Host: x", "User-Agent: foo", " bar"],
        )
        .unwrap();
        assert_eq!(r.header("User-Agent"), Some("foo bar"));
    }

    #[test]
    fn range_bytes_5_7_parses() {
        let r = req("GET /f HTTP/1.1", &["Host: x", "Range: bytes=5-7"]).unwrap();
        let range = r.byte_range(10).unwrap().unwrap();
        assert_eq!(range, ByteRange { start: 5, end: 7 });
    }

    #[test]
    fn range_minus_zero_is_absent() {
        let r = req("GET /f HTTP/1.1", &["Host: x", "Range: bytes=-0"]).unwrap();
        assert_eq!(r.byte_range(10).unwrap(), None);
    }

    #[test]
    fn range_start_beyond_size_is_416() {
        let r = req("GET /f HTTP/1.1", &["Host: x", "Range: bytes=20-"]).unwrap();
        assert!(matches!(
            r.byte_range(10).unwrap_err(),
            CoreError::RangeNotSatisfiable
        ));
    }

    #[test]
    fn comma_is_hard_error() {
        let r = req("GET /f HTTP/1.1", &["Host: x", "Range: bytes=0-1,2-3"]).unwrap();
        assert!(r.byte_range(10).is_err());
    }

    #[test]
    fn start_greater_than_end_is_no_range() {
        let r = req("GET /f HTTP/1.1", &["Host: x", "Range: bytes=7-5"]).unwrap();
        assert_eq!(r.byte_range(10).unwrap(), None);
    }
}
