use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};

pub mod aspect;
pub mod handler;
pub mod model;
pub mod naming;
pub mod repository;
pub mod service;
pub mod upload;

pub const MAX_VIDEO_UPLOAD_BYTES: usize = 1 << 30;
pub const MAX_THUMBNAIL_UPLOAD_BYTES: usize = 10 << 20;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/video_upload/{video_id}",
            post(handler::upload_video).layer(DefaultBodyLimit::max(MAX_VIDEO_UPLOAD_BYTES)),
        )
        .route(
            "/thumbnail_upload/{video_id}",
            post(handler::upload_thumbnail)
                .layer(DefaultBodyLimit::max(MAX_THUMBNAIL_UPLOAD_BYTES)),
        )
        .route("/videos", get(handler::list_videos))
        .route("/videos/{video_id}", get(handler::get_video))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
