use std::sync::Arc;

use tokio::io::AsyncWrite;

use crate::error::CoreError;
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::paths::resolve_local_path;
use crate::state::AppState;

use super::podcast_xml;

/// Handles a path ending in `/` (§4.3 Folder responder): delegates to the
/// podcast-XML responder if the path looks like a music set, otherwise
/// redirects to the same-named file without the trailing slash, or 403s
/// if a real directory exists (no listing), or 404s.
pub async fn respond<W: AsyncWrite + Unpin>(
    state: &Arc<AppState>,
    request: &Request,
    host_port: &str,
    writer: &mut W,
) -> Result<(), CoreError> {
    if podcast_xml::looks_like_music_set_path(&request.path) {
        return podcast_xml::respond(state, request, host_port, writer).await;
    }

    let without_slash = request.path.trim_end_matches('/');
    let same_named_file = resolve_local_path(&state.config.music_dir, without_slash);

    if same_named_file.is_file() {
        let redirect_to = request.raw_url.trim_end_matches('/').to_string();
        ResponseWriter::write_redirect(writer, &redirect_to, request.is_head()).await?;
        return Ok(());
    }

    let local_path = resolve_local_path(&state.config.music_dir, &request.path);
    if local_path.is_dir() {
        return Err(CoreError::Forbidden("directory listing is not supported".into()));
    }

    Err(CoreError::NotFound(format!("no such path: {}", request.path)))
}
