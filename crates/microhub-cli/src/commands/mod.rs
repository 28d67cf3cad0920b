pub mod assist;
pub mod common;
pub mod completions;
pub mod connect;
pub mod journal;
pub mod movie;
pub mod profile;
pub mod status;
pub mod task;
pub mod timer;
