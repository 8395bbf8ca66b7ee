use chrono::{DateTime, TimeZone, Utc};
use tokio::io::AsyncWrite;

use crate::error::CoreError;
use crate::http::request::Request;
use crate::http::response::{is_not_modified, ResponseWriter};
use crate::resources::render_banner;

/// Fixed base timestamp the banner's synthesized Last-Modified is built
/// from: base + (hours = major, minutes = minor, seconds = patch) of the
/// product version, so clients re-fetch after an upgrade (§4.3 Banner).
fn base_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 5, 12, 3, 0, 0).unwrap()
}

fn synthesized_last_modified() -> DateTime<Utc> {
    let version = env!("CARGO_PKG_VERSION");
    let mut parts = version.split('.').map(|p| p.parse::<i64>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    base_timestamp() + chrono::Duration::hours(major) + chrono::Duration::minutes(minor) + chrono::Duration::seconds(patch)
}

pub async fn respond<W: AsyncWrite + Unpin>(
    request: &Request,
    writer: &mut W,
) -> Result<(), CoreError> {
    let last_modified = synthesized_last_modified();
    if is_not_modified(request.if_modified_since(), last_modified) {
        ResponseWriter::write_not_modified(writer).await?;
        return Ok(());
    }

    let body = render_banner(env!("CARGO_PKG_VERSION"));
    let body_arg = if request.is_head() { None } else { Some(body.as_bytes()) };
    ResponseWriter::write_success(
        writer,
        "text/html; charset=UTF-8",
        body.len() as u64,
        Some(last_modified),
        &[("Cache-Control", "no-cache")],
        body_arg,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_modified_is_at_least_the_base_timestamp() {
        assert!(synthesized_last_modified() >= base_timestamp());
    }
}
