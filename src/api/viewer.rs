use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the host platform's stable user id
pub const VIEWER_ID_HEADER: &str = "x-viewer-id";
/// Header carrying the user's display name
pub const VIEWER_NAME_HEADER: &str = "x-viewer-name";

/// The current user, as supplied by the host platform.
///
/// Passed explicitly into handlers instead of living in module-level
/// globals. Requests without identity headers get the anonymous id `"0"`
/// and no display name.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub id: String,
    pub name: Option<String>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Viewer {
            id: header(VIEWER_ID_HEADER).unwrap_or_else(|| "0".to_string()),
            name: header(VIEWER_NAME_HEADER),
        })
    }
}
