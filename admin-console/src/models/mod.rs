pub mod page;
pub mod role;
pub mod user;
