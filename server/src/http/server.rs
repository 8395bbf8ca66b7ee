use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::{CoreError, CoreErrorKind};
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::http::responders;
use crate::state::AppState;

/// Upper bound on concurrently handled connections (§5: accept-dispatch
/// pool, 3..300). Tokio tasks are cheap enough that the lower bound isn't
/// separately modeled as a pre-warmed pool; the semaphore caps concurrency
/// at the same ceiling the source enforces.
const MAX_CONCURRENT_CONNECTIONS: usize = 300;

/// Listens on `http_hostname:http_port`, accepting connections in a loop
/// and dispatching each to its own task (component H). Accept errors are
/// logged and the loop continues.
pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.http_hostname, state.config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "podbridge listening");

    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_CONNECTIONS));

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                let state = Arc::clone(&state);
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire().await;
                    handle_connection(state, socket, peer).await;
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
            }
        }
    }
}

/// Per-connection worker (component I): parse, route, handle errors,
/// close resources (§4.7).
async fn handle_connection(state: Arc<AppState>, socket: TcpStream, peer: std::net::SocketAddr) {
    let host_port = format!("{}:{}", state.config.http_hostname, state.config.http_port);
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    match reader.read_line(&mut request_line).await {
        Ok(0) => return,
        Ok(_) => {}
        Err(e) => {
            tracing::error!(peer = %peer, error = %e, "failed to read request line");
            return;
        }
    }
    let request_line = request_line.trim_end().to_string();

    let mut header_lines = Vec::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);
                if trimmed.is_empty() {
                    break;
                }
                header_lines.push(trimmed.to_string());
            }
            Err(e) => {
                tracing::error!(peer = %peer, error = %e, "failed to read headers");
                return;
            }
        }
    }

    let result = process_request(&state, &request_line, &header_lines, &host_port, &mut write_half).await;

    if let Err(e) = result {
        match e.kind() {
            CoreErrorKind::ClientFault => {
                tracing::info!(peer = %peer, error = %e, "request failed");
            }
            CoreErrorKind::ServerFault => {
                tracing::error!(peer = %peer, error = %e, "request failed");
            }
        }
        let is_head = request_line.starts_with("HEAD ");
        if let Err(write_err) = ResponseWriter::write_error(&mut write_half, &e, is_head).await {
            tracing::error!(peer = %peer, error = %write_err, "failed to write error response");
        }
    }

    let _ = write_half.flush().await;
    let _ = write_half.shutdown().await;
}

async fn process_request(
    state: &Arc<AppState>,
    request_line: &str,
    header_lines: &[String],
    host_port: &str,
    writer: &mut (impl tokio::io::AsyncWrite + Unpin),
) -> Result<(), CoreError> {
    let request = Request::parse(request_line, header_lines)?;
    let effective_host = request.host().unwrap_or(host_port).to_string();
    responders::dispatch(state, &request, &effective_host, writer).await
}
