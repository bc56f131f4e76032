use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use crate::carousell::search::build_feed;
use crate::carousell::traits::CarousellApi;
use crate::carousell::types::{SearchParams, SearchQuery};

/// JSON Feed media type, served instead of plain application/json.
pub const FEED_CONTENT_TYPE: &str = "application/feed+json";

/// Shared handles available to every request.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn CarousellApi>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the application router. The feed is served on both the bare root
/// and /search.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_feed))
        .route("/search", get(serve_feed))
        .with_state(state)
}

/// Validate the request, run the search and serve the assembled feed.
/// Validation problems come back as one 400 listing every bad field;
/// upstream problems come back as a 500 with a short description.
async fn serve_feed(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = match SearchQuery::from_params(params) {
        Ok(query) => query,
        Err(errors) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: errors.join(", "),
                }),
            )
                .into_response();
        }
    };

    match build_feed(state.api.as_ref(), &query).await {
        Ok(feed) => match serde_json::to_string(&feed) {
            Ok(body) => ([(header::CONTENT_TYPE, FEED_CONTENT_TYPE)], body).into_response(),
            Err(error) => {
                error!("\"{}\" - failed to serialize feed: {}", query.query, error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Feed serialization failed".to_string(),
                    }),
                )
                    .into_response()
            }
        },
        Err(error) => {
            error!("\"{}\" - feed generation failed: {}", query.query, error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: error.to_string(),
                }),
            )
                .into_response()
        }
    }
}
