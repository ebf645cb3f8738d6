pub mod account;
pub mod avatar;
pub mod composer;
pub mod gallery;
pub mod media_client;
pub mod session;
pub mod share;
pub mod upload_flow;
