pub mod config;
pub mod export;
pub mod link;
pub mod locations;
pub mod profile;
pub mod report;
pub mod schools;
pub mod select;
pub mod sync;
