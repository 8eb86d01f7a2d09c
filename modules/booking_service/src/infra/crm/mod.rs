//! Record store over HTTP

pub mod client;
pub mod wire;

pub use client::HttpRecordStore;
