pub mod agents;
pub mod booking;
pub mod config;
pub mod dispatch;
pub mod log;
pub mod pool;
pub mod region;
