pub mod notifications;
pub mod profile;
pub mod requests;
pub mod session;
pub mod vehicles;
pub mod visitors;
pub mod watch;
