pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod label;
pub mod notify;
pub mod processor;
pub mod storage;
