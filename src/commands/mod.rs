pub mod completions;
pub mod config;
pub mod dispatch;
pub mod doctor;
