use crate::modules::video::model::Video;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::upload_video,
        crate::modules::video::handler::upload_thumbnail,
        crate::modules::video::handler::get_video,
        crate::modules::video::handler::list_videos,
    ),
    components(schemas(Video)),
    tags(
        (name = "Videos", description = "Video upload and retrieval")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_video_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        assert!(paths.contains(&"/api/video_upload/{video_id}"));
        assert!(paths.contains(&"/api/thumbnail_upload/{video_id}"));
        assert!(paths.contains(&"/api/videos/{video_id}"));
        assert!(paths.contains(&"/api/videos"));
    }
}
