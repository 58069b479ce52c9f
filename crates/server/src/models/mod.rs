pub mod listing;
pub mod message;
pub mod session;
pub mod user;
