use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "web/dist"]
pub struct Assets;

const SHELL: &str = "index.html";

/// Maps a request path onto a file in the bundle. Extensionless paths are
/// client-side routes and resolve to the shell page.
fn bundle_path(uri: &Uri) -> &str {
    let path = uri.path().trim_start_matches('/');
    let is_route = path
        .rsplit('/')
        .next()
        .is_none_or(|segment| !segment.contains('.'));

    if path.is_empty() || is_route { SHELL } else { path }
}

/// Fingerprinted build output can be cached forever; the shell must be
/// revalidated so new deploys are picked up.
fn cache_policy(path: &str) -> &'static str {
    if path.starts_with("assets/") {
        "public, max-age=31536000, immutable"
    } else {
        "no-cache"
    }
}

pub async fn serve_embedded(uri: Uri) -> Response {
    let path = bundle_path(&uri);

    let Some(file) = Assets::get(path) else {
        tracing::debug!(path, "asset not in bundle");
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CACHE_CONTROL, cache_policy(path).to_string()),
        ],
        file.data.into_owned(),
    )
        .into_response()
}
