// Database models for the subscription service

pub mod subscription;

pub use subscription::*;
