//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for services outside the record workflow, such as
//! upload storage.

pub mod storage;
