use crate::config::settings::AppConfig;
use crate::infrastructure::media::MediaToolkit;
use crate::infrastructure::storage::ObjectStore;
use crate::modules::video::repository::VideoStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaToolkit>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaToolkit>,
    ) -> Self {
        Self {
            config,
            videos,
            storage,
            media,
        }
    }
}
