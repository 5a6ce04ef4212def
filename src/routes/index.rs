use crate::error::RollcallError;
use axum::{http::Uri, response::Redirect};

pub async fn get_index_route() -> Redirect {
    Redirect::to("/students")
}

pub async fn fallback(uri: Uri) -> RollcallError {
    RollcallError::UnknownPath {
        path: uri.path().to_string(),
    }
}
