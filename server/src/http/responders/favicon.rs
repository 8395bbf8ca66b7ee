use chrono::{TimeZone, Utc};
use tokio::io::AsyncWrite;

use crate::error::CoreError;
use crate::http::request::Request;
use crate::http::response::{is_not_modified, ResponseWriter};
use crate::resources::favicon_bytes;

fn fixed_last_modified() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 5, 8, 4, 0, 0).unwrap()
}

pub async fn respond<W: AsyncWrite + Unpin>(
    request: &Request,
    writer: &mut W,
) -> Result<(), CoreError> {
    let last_modified = fixed_last_modified();
    if is_not_modified(request.if_modified_since(), last_modified) {
        ResponseWriter::write_not_modified(writer).await?;
        return Ok(());
    }

    let bytes = favicon_bytes();
    let body_arg = if request.is_head() { None } else { Some(bytes) };
    ResponseWriter::write_success(
        writer,
        "image/x-icon",
        bytes.len() as u64,
        Some(last_modified),
        &[],
        body_arg,
    )
    .await?;
    Ok(())
}
