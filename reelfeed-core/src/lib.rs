//! # Reelfeed Core Library
//!
//! Feed synchronization core of a short-video learning app:
//! - Data model (videos, comments, sessions)
//! - Storage layers (key-value store, video document collection)
//! - Feed synchronizers (remote document-collection mode, local side-table mode)
//! - Session handling and configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod session;

pub use error::{Error, Result};
pub use models::{Comment, Identity, LocalVideo, Role, Session, Upload, Video};
