use super::model::Video;
use super::service::VideoService;
use super::upload::{UploadError, UploadFailure, UploadOrchestrator};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::UploadedMedia;
use crate::middleware::auth::TokenClaims;
use crate::state::AppState;
use axum::{
    Extension,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::info;
use uuid::Uuid;

type ApiResult<T> = Result<ApiSuccess<ApiResponse<T>>, ApiError>;

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let (message, status) = match &err.failure {
            UploadFailure::InvalidContentType(_) => ("Invalid Content-Type", StatusCode::BAD_REQUEST),
            UploadFailure::UnsupportedMediaType(_) => ("Invalid media type", StatusCode::BAD_REQUEST),
            UploadFailure::Staging(io) => (
                "Couldn't write file to disk",
                io.get_ref()
                    .and_then(|inner| inner.downcast_ref::<MultipartError>())
                    .map(MultipartError::status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ),
            UploadFailure::Media(_) => ("Couldn't process video", StatusCode::INTERNAL_SERVER_ERROR),
            UploadFailure::Storage(_) => ("Issue uploading video", StatusCode::INTERNAL_SERVER_ERROR),
            UploadFailure::Database(_) => (
                "Couldn't update video information",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        };
        ApiError::with_cause(message, &err.failure, status)
    }
}

fn parse_video_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::with_cause("Invalid ID", e, StatusCode::BAD_REQUEST))
}

fn form_error(err: MultipartError) -> ApiError {
    let status = err.status();
    ApiError::with_cause("Couldn't parse form data", err, status)
}

async fn load_owned_video(state: &AppState, video_id: Uuid, user_id: Uuid) -> Result<Video, ApiError> {
    let video = state
        .videos
        .get_video(video_id)
        .await
        .map_err(|e| ApiError::with_cause("Couldn't find video", e, StatusCode::INTERNAL_SERVER_ERROR))?
        .ok_or_else(|| ApiError("Video not found".to_string(), StatusCode::NOT_FOUND))?;

    if video.user_id != user_id {
        return Err(ApiError(
            "Not authorized to update video".to_string(),
            StatusCode::UNAUTHORIZED,
        ));
    }
    Ok(video)
}

async fn signed(state: &AppState, video: Video) -> Result<Video, ApiError> {
    VideoService::sign_video(state.storage.as_ref(), video, state.config.presign_expiry())
        .await
        .map_err(|e| ApiError::with_cause("Couldn't sign video URLs", e, StatusCode::INTERNAL_SERVER_ERROR))
}

/// Upload Video
/// Remuxes the `video` form file for fast start and stores it by orientation
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Form field `video` holding an MP4 file (max 1 GiB)"),
    responses(
        (status = 200, description = "Upload successful", body = ApiResponse<Video>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Video> {
    let video_id = parse_video_id(&video_id)?;
    let video = load_owned_video(&state, video_id, claims.sub).await?;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some("video") {
            continue;
        }

        info!(%video_id, user_id = %claims.sub, "Uploading video");
        let upload = UploadedMedia {
            content_type: field.content_type().map(str::to_string),
            body: StreamReader::new(Box::pin(field.map_err(std::io::Error::other))),
        };

        let video = UploadOrchestrator::from_state(&state).process(video, upload).await?;
        let video = signed(&state, video).await?;

        return Ok(ApiSuccess(
            ApiResponse::success(video, "Video uploaded successfully"),
            StatusCode::OK,
        ));
    }

    Err(ApiError(
        "Missing form file field 'video'".to_string(),
        StatusCode::BAD_REQUEST,
    ))
}

/// Upload Thumbnail
/// Stores the `thumbnail` form file and links it to the video
#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Form field `thumbnail` holding an image (max 10 MiB)"),
    responses(
        (status = 200, description = "Upload successful", body = ApiResponse<Video>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Video> {
    let video_id = parse_video_id(&video_id)?;
    let video = load_owned_video(&state, video_id, claims.sub).await?;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some("thumbnail") {
            continue;
        }

        let media_type = match field.content_type() {
            Some(content_type) if !content_type.trim().is_empty() => content_type
                .parse::<mime::Mime>()
                .map_err(|e| ApiError::with_cause("Invalid Content-Type", e, StatusCode::BAD_REQUEST))?
                .essence_str()
                .to_string(),
            _ => {
                return Err(ApiError(
                    "Missing Content-Type for thumbnail".to_string(),
                    StatusCode::BAD_REQUEST,
                ));
            }
        };

        info!(%video_id, user_id = %claims.sub, %media_type, "Uploading thumbnail");
        let data = field.bytes().await.map_err(form_error)?;

        let video = VideoService::attach_thumbnail(&state, video, &media_type, data)
            .await
            .map_err(|e| ApiError::with_cause("Couldn't store thumbnail", e, StatusCode::INTERNAL_SERVER_ERROR))?;
        let video = signed(&state, video).await?;

        return Ok(ApiSuccess(
            ApiResponse::success(video, "Thumbnail uploaded successfully"),
            StatusCode::OK,
        ));
    }

    Err(ApiError(
        "Missing form file field 'thumbnail'".to_string(),
        StatusCode::BAD_REQUEST,
    ))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Success", body = ApiResponse<Video>),
        (status = 404, description = "Not Found")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Video> {
    let video_id = parse_video_id(&video_id)?;

    let video = VideoService::get_video(&state, video_id)
        .await
        .map_err(|e| ApiError::with_cause("Couldn't get video", e, StatusCode::INTERNAL_SERVER_ERROR))?
        .ok_or_else(|| ApiError("Video not found".to_string(), StatusCode::NOT_FOUND))?;

    Ok(ApiSuccess(
        ApiResponse::success(video, "Video retrieved successfully"),
        StatusCode::OK,
    ))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "Videos owned by the caller", body = ApiResponse<Vec<Video>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> ApiResult<Vec<Video>> {
    let videos = VideoService::list_videos(&state, claims.sub)
        .await
        .map_err(|e| ApiError::with_cause("Couldn't retrieve videos", e, StatusCode::INTERNAL_SERVER_ERROR))?;

    Ok(ApiSuccess(
        ApiResponse::success(videos, "Videos retrieved successfully"),
        StatusCode::OK,
    ))
}
