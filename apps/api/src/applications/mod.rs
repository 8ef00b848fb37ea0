pub mod handlers;
pub mod storage;
pub mod validate;
