//! Data models for proforma invoice extraction.

pub mod canonical;
pub mod config;
pub mod invoice;
pub mod record;
