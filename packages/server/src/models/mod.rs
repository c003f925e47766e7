pub mod achievement;
pub mod auth;
pub mod shared;
pub mod user;
