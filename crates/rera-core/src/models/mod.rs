//! Data models for layouts, structured documents and project records.

pub mod config;
pub mod document;
pub mod layout;
pub mod project;
