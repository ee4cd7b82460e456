pub mod engine;
pub mod medals;
pub mod publisher;
pub mod ranking;
pub mod scoring;
pub mod session_lock;
