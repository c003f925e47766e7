pub mod achievement_reference;
pub mod lecturer;
pub mod role;
pub mod role_permission;
pub mod student;
pub mod user;
