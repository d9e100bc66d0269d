//! Generate Delphi units from Protocol Buffer schemas.
//!
//! `protoc-gen-delphi` is a `protoc` plugin. For every requested `.proto`
//! file it emits one Delphi unit declaring a class per message, with typed
//! properties, presence accessors, oneof case tracking, and the encode,
//! decode, merge, clear and assign methods of the companion runtime library.
//!
//! # Features
//!
//! - Collision-free identifiers: every generated name comes from a per-kind
//!   naming template, and clashes get a deterministic `_` suffix
//! - proto3 no-presence semantics for plain fields, explicit presence for
//!   oneof members (proto3 `optional` included)
//! - Nested messages and enums as nested Delphi types
//! - Runtime units under a configurable namespace (`runtime_namespace=...`)
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use protoc_gen_delphi::plugin::{self, Options};
//!
//! let files = protoc_gen_delphi::schema::load_descriptor_set(Path::new("schema.pb"))?;
//! let units = plugin::generate(&files, &["shapes/point.proto".to_string()], &Options::default())?;
//! plugin::write_units(Path::new("out/"), &units)?;
//! # Ok::<(), protoc_gen_delphi::error::Error>(())
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ident;
pub mod plugin;
pub mod render;
pub mod schema;
pub mod type_map;
