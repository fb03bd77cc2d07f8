//! HTTP surface for the smart protocol: the axum router, the two endpoint
//! handlers, lazy snapshot initialization, and the response header policy.
//!
//! The snapshot is captured on the first request that needs it, guarded by
//! a `OnceCell` so concurrent first requests trigger a single directory
//! walk; afterwards every handler reads the same immutable `Arc`.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::OnceCell;

use crate::{
    protocol::{
        smart::SmartProtocol,
        types::{ProtocolError, ServiceType},
    },
    snapshot::Snapshot,
};

/// Content type of the `/info/refs` advertisement.
pub const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
/// Content type a client must send with an upload-pack request body.
pub const UPLOAD_PACK_REQUEST_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";
/// Content type of the upload-pack response.
pub const UPLOAD_PACK_RESULT_CONTENT_TYPE: &str = "application/x-git-upload-pack-result";

/// Pre-expired timestamp used to defeat intermediary caching.
const EXPIRES_EPOCH: &str = "Fri, 01 Jan 1980 00:00:00 GMT";

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProtocolError::InvalidService(_) => StatusCode::FORBIDDEN,
            ProtocolError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProtocolError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            ProtocolError::Io(_) | ProtocolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Process-wide state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    root: Arc<PathBuf>,
    snapshot: Arc<OnceCell<Arc<Snapshot>>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
            snapshot: Arc::new(OnceCell::new()),
        }
    }

    /// The snapshot, capturing it on first use. The directory walk runs on
    /// the blocking pool; the cell guarantees it runs at most once.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, ProtocolError> {
        self.snapshot
            .get_or_try_init(|| async {
                let root = self.root.clone();
                let snapshot = tokio::task::spawn_blocking(move || Snapshot::capture(&root))
                    .await
                    .map_err(|e| ProtocolError::Internal(format!("snapshot task failed: {e}")))??;
                Ok(Arc::new(snapshot))
            })
            .await
            .cloned()
    }
}

/// Build the two-endpoint router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/info/refs", get(info_refs))
        .route("/git-upload-pack", post(upload_pack))
        .with_state(state)
}

/// `GET /info/refs?service=git-upload-pack`: the ref advertisement.
async fn info_refs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ProtocolError> {
    let service = params.get("service").map(String::as_str).unwrap_or_default();
    // Anything but upload-pack (including a missing parameter) is refused.
    let service: ServiceType = service.parse()?;

    let snapshot = state.snapshot().await?;
    let smart = SmartProtocol::new(&snapshot);
    let body = smart.git_info_refs();

    tracing::debug!(service = %service, head = %snapshot.head, "advertising refs");
    Ok((
        no_cache_headers(ADVERTISEMENT_CONTENT_TYPE),
        body.freeze(),
    )
        .into_response())
}

/// `POST /git-upload-pack`: negotiation and the pack stream.
async fn upload_pack(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProtocolError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != UPLOAD_PACK_REQUEST_CONTENT_TYPE {
        return Err(ProtocolError::InvalidRequest(format!(
            "Invalid Content-Type: {content_type}"
        )));
    }

    let snapshot = state.snapshot().await?;
    let mut smart = SmartProtocol::new(&snapshot);
    let response_body = smart.git_upload_pack(body)?;

    Ok((
        no_cache_headers(UPLOAD_PACK_RESULT_CONTENT_TYPE),
        response_body.freeze(),
    )
        .into_response())
}

/// Git clients require responses to be uncacheable.
fn no_cache_headers(content_type: &'static str) -> [(header::HeaderName, &'static str); 4] {
    [
        (header::CONTENT_TYPE, content_type),
        (header::CACHE_CONTROL, "no-cache"),
        (header::EXPIRES, EXPIRES_EPOCH),
        (header::PRAGMA, "no-cache"),
    ]
}
