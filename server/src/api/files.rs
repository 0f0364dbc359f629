//! Public disk access
//!
//! Serves stored images by their generated filename.

use crate::app::AppState;
use crate::error::Result;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// GET /storage/{name}
pub async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response> {
    let data = state.users_service.read_image(&name).await?;
    let content_type = content_type_for(&name);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.as_str()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            // SVG can carry script; never let it run from this origin
            (header::CONTENT_SECURITY_POLICY, "default-src 'none'; style-src 'unsafe-inline'; sandbox"),
        ],
        data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("abc.png"), "image/png");
        assert_eq!(content_type_for("abc.JPG"), "image/jpeg");
        assert_eq!(content_type_for("abc.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("abc.jfif"), "image/jpeg");
        assert_eq!(content_type_for("abc.gif"), "image/gif");
        assert_eq!(content_type_for("abc.svg"), "image/svg+xml");
        assert_eq!(content_type_for("abc"), "application/octet-stream");
    }
}
