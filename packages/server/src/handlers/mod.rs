pub mod achievement;
pub mod auth;
pub mod report;
pub mod user;
