//! Schema-to-AST mapping.
//!
//! Generators nest the way the schema does: a [`unit`] generator per schema
//! file composes [`enums`] and [`message`] generators, and each message
//! composes one [`field`] generator per field plus one [`oneof`] generator
//! per oneof. Every generator is a pure function of the schema tree, the
//! cross-file [`index::TypeIndex`] and the runtime naming scheme.
//!
//! Each message class gets the same lifecycle skeleton regardless of its
//! fields:
//!
//! | Method | Body |
//! |--------|------|
//! | `Create` | inherited, per-field create fragments, `ClearOwnFields` |
//! | `Destroy` | per-field destroy fragments in reverse, inherited |
//! | `Clear` | inherited, `ClearOwnFields` |
//! | `Encode` / `Decode` | inherited, per-field fragments in declaration order |
//! | `MergeFrom` / `Assign` | cast source, inherited, `MergeFromOwnFields` / `AssignOwnFields` |
//!
//! The private `*OwnFields` helpers concatenate the per-field fragments, so
//! ancestor logic is never re-run for a subclass's fields.

pub mod enums;
pub mod field;
pub mod index;
pub mod message;
pub mod names;
pub mod oneof;
pub mod unit;

pub use index::TypeIndex;
pub use unit::{UnitIdentifier, generate_unit};

use crate::type_map::RuntimeSupport;

/// What every generator of one unit shares.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub index: &'a TypeIndex,
    pub runtime: &'a RuntimeSupport,

    /// Full dotted name of the unit being generated.
    pub unit: &'a str,
}

/// Unit references in first-use order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsesList(Vec<String>);

impl UsesList {
    pub fn add(&mut self, unit: impl Into<String>) {
        let unit = unit.into();
        if !self.0.contains(&unit) {
            self.0.push(unit);
        }
    }

    pub fn extend<I, S>(&mut self, units: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for unit in units {
            self.add(unit);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Pascal string literal for `value`.
pub fn pascal_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
