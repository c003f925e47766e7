mod common;

mod achievement;
mod user;
