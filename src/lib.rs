pub mod app;
pub mod classify;
pub mod config;
pub mod container;
pub mod document;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod imaging;
pub mod index;
pub mod labels;
pub mod manifest;
pub mod normalize;
pub mod output;
pub mod render;
pub mod store;
pub mod walker;
