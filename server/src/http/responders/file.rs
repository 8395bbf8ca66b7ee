use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::error::CoreError;
use crate::freshen;
use crate::http::request::Request;
use crate::http::response::{is_not_modified, ResponseWriter};
use crate::paths::resolve_local_path;
use crate::state::AppState;

use super::podcast_xml;

const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Serves a single file beneath the music directory (§4.3 File responder).
pub async fn respond<W>(
    state: &Arc<AppState>,
    request: &Request,
    host_port: &str,
    writer: &mut W,
) -> Result<(), CoreError>
where
    W: AsyncWrite + Unpin,
{
    if podcast_xml::looks_like_music_set_path(&request.path) {
        return podcast_xml::respond(state, request, host_port, writer).await;
    }

    let local_path = resolve_local_path(&state.config.music_dir, &request.path);

    if local_path.is_dir() {
        let redirect_to = format!("{}/", request.raw_url.trim_end_matches('/'));
        ResponseWriter::write_redirect(writer, &redirect_to, request.is_head()).await?;
        return Ok(());
    }

    let metadata = match tokio::fs::metadata(&local_path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::NotFound(format!("no such file: {}", request.path)))
        }
        Err(e) => return Err(CoreError::Io(e)),
    };

    freshen::touch_last_used(&local_path);

    let last_modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    if is_not_modified(request.if_modified_since(), last_modified) {
        ResponseWriter::write_not_modified(writer).await?;
        return Ok(());
    }

    let content_type = mime_guess::from_path(&local_path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let file_size = metadata.len();
    let range = request.byte_range(file_size)?;
    let (start, end) = match range {
        Some(r) => (r.start, r.end),
        None => (0, file_size.saturating_sub(1)),
    };

    let mut file = match tokio::fs::File::open(&local_path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::NotFound(format!("no such file: {}", request.path)))
        }
        Err(e) => return Err(CoreError::Io(e)),
    };

    match range {
        Some(r) => {
            ResponseWriter::write_partial(writer, &content_type, r.start, r.end, file_size, Some(last_modified))
                .await?
        }
        None => {
            ResponseWriter::write_success(writer, &content_type, file_size, Some(last_modified), &[], None)
                .await?
        }
    }

    if request.is_head() {
        return Ok(());
    }

    if let Err(e) = stream_range(&mut file, writer, start, end).await {
        if is_broken_pipe(&e) && request.is_from_known_podcast_agent() {
            tracing::info!(path = %local_path.display(), "client disconnected mid-stream");
        } else {
            return Err(CoreError::Io(e));
        }
    }

    Ok(())
}

/// Streams `[start, end]` (inclusive) of `file` to `writer` in fixed-size
/// buffers (~64 KiB), matching the source's buffered-copy loop (§4.3.6).
async fn stream_range<R, W>(file: &mut R, writer: &mut W, start: u64, end: u64) -> std::io::Result<()>
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    use tokio::io::AsyncReadExt;

    file.seek(std::io::SeekFrom::Start(start)).await?;
    let mut remaining = end - start + 1;
    let mut buf = vec![0u8; STREAM_BUFFER_SIZE];

    while remaining > 0 {
        let to_read = remaining.min(STREAM_BUFFER_SIZE as u64) as usize;
        let read = file.read(&mut buf[..to_read]).await?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read]).await?;
        remaining -= read as u64;
    }
    writer.flush().await?;
    Ok(())
}

fn is_broken_pipe(e: &std::io::Error) -> bool {
    matches!(e.kind(), std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_pipe_is_recognized() {
        let e = std::io::Error::from(std::io::ErrorKind::BrokenPipe);
        assert!(is_broken_pipe(&e));
    }

    #[tokio::test]
    async fn streams_requested_byte_window() {
        let data = b"0123456789".to_vec();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        tokio::fs::write(&path, &data).await.unwrap();

        let mut file = tokio::fs::File::open(&path).await.unwrap();
        let mut out = Vec::new();
        stream_range(&mut file, &mut out, 5, 7).await.unwrap();
        assert_eq!(out, b"567");
    }
}
