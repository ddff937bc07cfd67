//! tplg Core - Audio topology binary decoding and validation
//!
//! This crate provides the building blocks of the topology checker:
//! - Wire-format record parsing over a sequential byte cursor
//! - Generic vendor tuple (token) decoding into typed descriptors
//! - Per-kind component and DAI link loaders
//! - A record catalog built in one pass over the whole binary
//! - Semantic validation with configurable bounds

pub mod catalog;
pub mod component;
pub mod limits;
pub mod link;
pub mod tokens;
pub mod validate;
pub mod wire;

#[cfg(test)]
mod fixtures;

pub use catalog::{Catalog, CatalogError, DaiLink, Pipeline, Widget};
pub use component::{Component, ComponentError, DaiType, FrameFormat};
pub use limits::{Bound, Limits};
pub use link::{DaiLinkConfig, LinkError, LinkVariant};
pub use tokens::TokenError;
pub use validate::{validate, Category, Finding, Report};
pub use wire::{RecordKind, WidgetKind, WireError};
