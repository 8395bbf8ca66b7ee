use std::fmt;

/// The request-facing error type every responder converts its failures
/// into. Each variant carries the HTTP status it maps to so the header
/// writer (component B) never has to re-derive it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("bad request: {0}")]
    ClientRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("range not satisfiable")]
    RangeNotSatisfiable,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("unsupported http version")]
    VersionNotSupported,

    #[error("unsupported request: {0}")]
    Unsupported(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::ClientRequest(_) => 400,
            CoreError::NotFound(_) => 404,
            CoreError::Forbidden(_) => 403,
            CoreError::RangeNotSatisfiable => 416,
            CoreError::MethodNotAllowed => 405,
            CoreError::VersionNotSupported => 505,
            CoreError::Unsupported(_) => 500,
            CoreError::Remote(_) => 500,
            CoreError::Io(_) => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self.status_code() {
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            416 => "Range Not Satisfiable",
            500 => "Internal Server Error",
            505 => "HTTP Version Not Supported",
            _ => "Error",
        }
    }

    /// Explanatory text shown in the error body, distinct from the terse
    /// reason phrase (e.g. "There's no remote user with username ghost").
    pub fn explanation(&self) -> String {
        match self {
            CoreError::ClientRequest(m)
            | CoreError::NotFound(m)
            | CoreError::Forbidden(m)
            | CoreError::Unsupported(m)
            | CoreError::Remote(m) => m.clone(),
            CoreError::RangeNotSatisfiable => "the requested range cannot be satisfied".into(),
            CoreError::MethodNotAllowed => "only GET and HEAD are supported".into(),
            CoreError::VersionNotSupported => "only HTTP/1.x is supported".into(),
            CoreError::Io(e) => e.to_string(),
        }
    }
}

/// Errors surfaced by the remote client (component D), distinguished so
/// the podcast-XML responder can map `UserNotFound`/`PlaylistNotFound` to
/// 404 while everything else becomes 500 (see §7.4).
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("there's no remote user with username {0}")]
    UserNotFound(String),

    #[error("there's no playlist with slug {0} for user {1}")]
    PlaylistNotFound(String, String),

    #[error("remote request timed out")]
    Timeout,

    #[error("remote transport error: {0}")]
    Transport(String),

    #[error("remote returned no data")]
    NoData,

    #[error("remote graphql error: {0}")]
    GraphQl(String),
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match &err {
            RemoteError::UserNotFound(u) => {
                CoreError::NotFound(format!("There's no remote user with username {u}"))
            }
            RemoteError::PlaylistNotFound(slug, user) => CoreError::NotFound(format!(
                "There's no playlist with slug {slug} for user {user}"
            )),
            _ => CoreError::Remote(err.to_string()),
        }
    }
}

impl fmt::Display for CoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lightweight classification used only for log-level selection
/// (§4.7.4: HTTP errors under 500 log at INFO, the rest at ERROR).
#[derive(Debug, Clone, Copy)]
pub enum CoreErrorKind {
    ClientFault,
    ServerFault,
}

impl CoreError {
    pub fn kind(&self) -> CoreErrorKind {
        if self.status_code() < 500 {
            CoreErrorKind::ClientFault
        } else {
            CoreErrorKind::ServerFault
        }
    }
}
