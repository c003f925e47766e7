pub mod achievement;
pub mod achievement_status;
pub mod config;
pub mod document;
pub mod role;

pub use achievement::{AchievementContent, AchievementType};
pub use achievement_status::AchievementStatus;
pub use role::Role;
