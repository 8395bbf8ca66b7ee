//! Per-route handlers (component C): banner, favicon, file, folder, and
//! podcast-XML. The request worker (component I) picks one via `route`.

pub mod banner;
pub mod favicon;
pub mod file;
pub mod folder;
pub mod podcast_xml;

use std::sync::Arc;

use tokio::io::AsyncWrite;

use crate::error::CoreError;
use crate::http::request::Request;
use crate::state::AppState;

#[derive(Debug, Eq, PartialEq)]
enum RouteTarget {
    Banner,
    Favicon,
    PodcastXml,
    Folder,
    File,
}

/// Picks a responder by inspecting the lowercased path (§4.3 routing).
/// File-system lookups still use the original-case path; only the
/// dispatch decision is case-folded (§9 "suspicious behavior preserved").
fn route(path: &str) -> RouteTarget {
    let lower = path.to_ascii_lowercase();
    if lower == "/" {
        RouteTarget::Banner
    } else if lower.ends_with(".xml") {
        RouteTarget::PodcastXml
    } else if lower.ends_with("/favicon.ico") {
        RouteTarget::Favicon
    } else if lower.ends_with('/') {
        RouteTarget::Folder
    } else {
        RouteTarget::File
    }
}

/// Dispatches a parsed request to its responder (§2 control flow:
/// H accepts → spawns I → I uses A to parse → routes to a C instance).
pub async fn dispatch<W: AsyncWrite + Unpin>(
    state: &Arc<AppState>,
    request: &Request,
    host_port: &str,
    writer: &mut W,
) -> Result<(), CoreError> {
    match route(&request.path) {
        RouteTarget::Banner => banner::respond(request, writer).await,
        RouteTarget::Favicon => favicon::respond(request, writer).await,
        RouteTarget::PodcastXml => podcast_xml::respond(state, request, host_port, writer).await,
        RouteTarget::Folder => folder::respond(state, request, host_port, writer).await,
        RouteTarget::File => file::respond(state, request, host_port, writer).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_suffix() {
        assert_eq!(route("/"), RouteTarget::Banner);
        assert_eq!(route("/alice.xml"), RouteTarget::PodcastXml);
        assert_eq!(route("/favicon.ico"), RouteTarget::Favicon);
        assert_eq!(route("/alice/"), RouteTarget::Folder);
        assert_eq!(route("/alice/track.m4a"), RouteTarget::File);
    }
}
