pub mod actions;
pub mod aws;
pub mod cli;
pub mod config;
pub mod constants;
pub mod exchange;
pub mod idp;
