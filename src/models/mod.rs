pub mod post;
pub mod setting;
pub mod user;
