pub mod handlers;
pub mod rating;
