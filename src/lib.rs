pub mod cli;
pub mod client;
pub mod config;
pub mod export;
pub mod playback;
pub mod report;
pub mod scene;
pub mod view;
pub mod viewer;
