pub mod config;
pub mod dashboard;
pub mod export;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod record;
