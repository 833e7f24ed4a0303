pub mod config;
pub mod policy;
pub mod simulate;
pub mod worklock;
