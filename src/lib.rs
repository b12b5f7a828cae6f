pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod index;
pub mod naming;
pub mod playback;
pub mod schedule;
pub mod service;
pub mod tasks {
    pub mod commands;
}
