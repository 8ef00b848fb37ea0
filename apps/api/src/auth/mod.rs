pub mod handlers;
pub mod password;
pub mod session;

pub use session::CurrentUser;
