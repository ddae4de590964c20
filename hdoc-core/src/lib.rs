#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::result_large_err,
    clippy::enum_glob_use,
    clippy::implicit_hasher,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::wildcard_imports,
    clippy::module_inception
)]
#![cfg_attr(test, allow(clippy::too_many_lines))]

//! The normalized-document substrate: identifiers, schemas, nodes, the
//! breadth/depth-first walker, and the mutable copy-on-write overlay that
//! records structural edits as a command log.
//!
//! Everything in this crate is schema-agnostic: it has no notion of diffing
//! or merging, only of representing and editing a single hierarchical
//! document. [`hdoc`](https://docs.rs/hdoc) builds diff and merge on top of
//! it.

pub mod command;
pub mod document;
pub mod error;
pub mod mutable;
pub mod node;
pub mod path;
pub mod reference;
pub mod scalar;
pub mod schema;
pub mod walker;

pub use command::{Command, NewElement, Position, RefOrPath};
pub use document::{create_normalized_document, NormalizedDocument};
pub use error::DocumentError;
pub use mutable::{mutable_document, MutableDocument};
pub use node::{ChildLink, DataRecord, Node, ParentRef};
pub use path::{Path, Selector};
pub use reference::{ElementRef, Id, NodeType};
pub use scalar::{Scalar, ScalarType};
pub use schema::{DataFieldSchema, DocumentSchema, LinkFieldSchema, LinkVariant, NodeTypeSchema};
pub use walker::{visit_document, Order, WalkOptions};
