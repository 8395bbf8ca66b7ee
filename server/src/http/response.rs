use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::CoreError;
use crate::resources::render_error;

const PRODUCT: &str = "podbridge";
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn server_header() -> String {
    format!("{PRODUCT}/{VERSION} ({})", std::env::consts::OS)
}

/// Emits CRLF-terminated status line and headers, always including Date,
/// Server, `Connection: close` and `Accept-Ranges: bytes` (component B).
pub struct ResponseWriter;

impl ResponseWriter {
    async fn write_status_and_common<W: AsyncWrite + Unpin>(
        writer: &mut W,
        code: u16,
        reason: &str,
    ) -> std::io::Result<()> {
        writer
            .write_all(format!("HTTP/1.1 {code} {reason}\r\n").as_bytes())
            .await?;
        writer
            .write_all(format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now())).as_bytes())
            .await?;
        writer
            .write_all(format!("Server: {}\r\n", server_header()).as_bytes())
            .await?;
        writer.write_all(b"Connection: close\r\n").await?;
        writer.write_all(b"Accept-Ranges: bytes\r\n").await?;
        Ok(())
    }

    /// 200 OK with Last-Modified, Content-Type, Content-Length and any
    /// extra caller-supplied headers, in order. Body is omitted for HEAD.
    pub async fn write_success<W: AsyncWrite + Unpin>(
        writer: &mut W,
        content_type: &str,
        content_length: u64,
        last_modified: Option<DateTime<Utc>>,
        extra_headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> std::io::Result<()> {
        Self::write_status_and_common(writer, 200, "OK").await?;
        if let Some(lm) = last_modified {
            writer
                .write_all(format!("Last-Modified: {}\r\n", httpdate::fmt_http_date(lm.into())).as_bytes())
                .await?;
        }
        writer
            .write_all(format!("Content-Type: {content_type}\r\n").as_bytes())
            .await?;
        writer
            .write_all(format!("Content-Length: {content_length}\r\n").as_bytes())
            .await?;
        for (name, value) in extra_headers {
            writer.write_all(format!("{name}: {value}\r\n").as_bytes()).await?;
        }
        writer.write_all(b"\r\n").await?;
        if let Some(b) = body {
            writer.write_all(b).await?;
        }
        Ok(())
    }

    /// 206 Partial Content for `[start, end]` of `total_size` bytes.
    pub async fn write_partial<W: AsyncWrite + Unpin>(
        writer: &mut W,
        content_type: &str,
        start: u64,
        end: u64,
        total_size: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> std::io::Result<()> {
        Self::write_status_and_common(writer, 206, "Partial Content").await?;
        if let Some(lm) = last_modified {
            writer
                .write_all(format!("Last-Modified: {}\r\n", httpdate::fmt_http_date(lm.into())).as_bytes())
                .await?;
        }
        writer
            .write_all(format!("Content-Type: {content_type}\r\n").as_bytes())
            .await?;
        writer
            .write_all(format!("Content-Length: {}\r\n", end - start + 1).as_bytes())
            .await?;
        writer
            .write_all(format!("Content-Range: bytes {start}-{end}/{total_size}\r\n").as_bytes())
            .await?;
        writer.write_all(b"\r\n").await?;
        Ok(())
    }

    /// 304 Not Modified: no body, no content headers.
    pub async fn write_not_modified<W: AsyncWrite + Unpin>(writer: &mut W) -> std::io::Result<()> {
        Self::write_status_and_common(writer, 304, "Not Modified").await?;
        writer.write_all(b"\r\n").await
    }

    /// 301 redirect to `location`; body omitted on HEAD.
    pub async fn write_redirect<W: AsyncWrite + Unpin>(
        writer: &mut W,
        location: &str,
        is_head: bool,
    ) -> std::io::Result<()> {
        Self::write_status_and_common(writer, 301, "Moved Permanently").await?;
        writer
            .write_all(format!("Location: {location}\r\n").as_bytes())
            .await?;
        let body = format!("Moved to {location}\r\n");
        writer
            .write_all(format!("Content-Length: {}\r\n", body.len()).as_bytes())
            .await?;
        writer.write_all(b"Content-Type: text/plain\r\n").await?;
        writer.write_all(b"\r\n").await?;
        if !is_head {
            writer.write_all(body.as_bytes()).await?;
        }
        Ok(())
    }

    /// Error response: HTML body from the bundled template; HEAD omits
    /// the body but still reports the Content-Length it would have had.
    pub async fn write_error<W: AsyncWrite + Unpin>(
        writer: &mut W,
        error: &CoreError,
        is_head: bool,
    ) -> std::io::Result<()> {
        let code = error.status_code();
        let reason = error.reason_phrase();
        let body = render_error(code, reason, &error.explanation(), &format!("{error:?}"));

        Self::write_status_and_common(writer, code, reason).await?;
        writer.write_all(b"Content-Type: text/html; charset=UTF-8\r\n").await?;
        writer
            .write_all(format!("Content-Length: {}\r\n", body.len()).as_bytes())
            .await?;
        writer.write_all(b"\r\n").await?;
        if !is_head {
            writer.write_all(body.as_bytes()).await?;
        }
        Ok(())
    }
}

/// Given a resource's `last_modified` and a request's parsed
/// `If-Modified-Since`, returns true (and the caller should emit 304) if
/// the client's cached copy is still fresh at second granularity (§4.2).
pub fn is_not_modified(
    if_modified_since: Option<DateTime<Utc>>,
    resource_last_modified: DateTime<Utc>,
) -> bool {
    match if_modified_since {
        Some(client_date) => client_date.timestamp() >= resource_last_modified.timestamp(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_response_starts_with_status_line_and_ends_headers() {
        let mut buf = Vec::new();
        ResponseWriter::write_success(&mut buf, "text/plain", 5, None, &[], Some(b"hello"))
            .await
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("\r\n\r\n"));
        assert!(text.ends_with("hello"));
    }

    #[test]
    fn not_modified_when_client_date_at_or_after_resource_date() {
        let resource = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(is_not_modified(Some(resource), resource));
        let later = DateTime::<Utc>::from_timestamp(1_700_000_100, 0).unwrap();
        assert!(is_not_modified(Some(later), resource));
        let earlier = DateTime::<Utc>::from_timestamp(1_699_999_900, 0).unwrap();
        assert!(!is_not_modified(Some(earlier), resource));
        assert!(!is_not_modified(None, resource));
    }
}
