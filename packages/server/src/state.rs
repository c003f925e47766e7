use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::records::AchievementService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub records: AchievementService,
}
