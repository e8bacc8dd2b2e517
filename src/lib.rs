pub mod cli;
pub mod config;
pub mod graylog;
pub mod retrieval;
pub mod rules;
