pub mod application;
pub mod listing;
pub mod review;
pub mod user;
