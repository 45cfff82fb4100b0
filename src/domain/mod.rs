pub mod notification;
pub mod profile;
pub mod request;
pub mod session;
pub mod status;
pub mod validation;
pub mod vehicle;
pub mod visitor;
