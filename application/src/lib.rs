pub mod keys;
pub mod mapper;
pub mod patch;
pub mod service;
pub mod transfer;
pub mod validate;
