//! Cross-file lookup of units and types.
//!
//! Built once per request over every schema file the compiler supplied,
//! imports included. Generators resolve a field's fully-qualified protobuf
//! type name to the Delphi type it maps to and the unit that declares it.

use std::collections::BTreeMap;

use crate::codegen::names;
use crate::codegen::unit::UnitIdentifier;
use crate::error::{Error, Result};
use crate::schema::{EnumType, MessageType, SchemaFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// A protobuf message or enum as seen from generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub kind: TypeKind,

    /// Full dotted name of the declaring unit.
    pub unit: String,

    /// Class path inside the declaring unit (e.g. `"TOuter.TInner"`).
    pub local_name: String,
}

impl ResolvedType {
    /// How code in `unit` has to spell this type.
    pub fn reference_from(&self, unit: &str) -> String {
        if self.unit == unit {
            self.local_name.clone()
        } else {
            format!("{}.{}", self.unit, self.local_name)
        }
    }
}

#[derive(Debug, Default)]
pub struct TypeIndex {
    units: BTreeMap<String, UnitIdentifier>,
    types: BTreeMap<String, ResolvedType>,
}

impl TypeIndex {
    pub fn build(files: &[SchemaFile]) -> Result<Self> {
        let mut index = TypeIndex::default();
        for file in files {
            let unit = UnitIdentifier::for_file(file)?;
            let unit_name = unit.full_name();
            let scope = match &file.package {
                Some(package) => format!(".{package}"),
                None => String::new(),
            };
            for enum_type in &file.enums {
                index.add_enum(enum_type, &scope, None, &unit_name)?;
            }
            for message in &file.messages {
                index.add_message(message, &scope, None, &unit_name)?;
            }
            index.units.insert(file.name.clone(), unit);
        }
        log::debug!(
            "indexed {} files, {} types",
            index.units.len(),
            index.types.len()
        );
        Ok(index)
    }

    fn add_message(
        &mut self,
        message: &MessageType,
        scope: &str,
        parent: Option<&str>,
        unit: &str,
    ) -> Result<()> {
        let full_name = format!("{scope}.{}", message.name);
        let local_name = qualify(parent, &names::message_type_ident(message)?);

        for enum_type in &message.nested_enums {
            self.add_enum(enum_type, &full_name, Some(&local_name), unit)?;
        }
        for nested in &message.nested_messages {
            self.add_message(nested, &full_name, Some(&local_name), unit)?;
        }

        self.types.insert(
            full_name,
            ResolvedType {
                kind: TypeKind::Message,
                unit: unit.to_string(),
                local_name,
            },
        );
        Ok(())
    }

    fn add_enum(
        &mut self,
        enum_type: &EnumType,
        scope: &str,
        parent: Option<&str>,
        unit: &str,
    ) -> Result<()> {
        self.types.insert(
            format!("{scope}.{}", enum_type.name),
            ResolvedType {
                kind: TypeKind::Enum,
                unit: unit.to_string(),
                local_name: qualify(parent, &names::enum_type_ident(enum_type)?),
            },
        );
        Ok(())
    }

    /// Unit generated for the schema file `name`.
    pub fn unit(&self, name: &str, referenced_by: &str) -> Result<&UnitIdentifier> {
        self.units.get(name).ok_or_else(|| Error::MissingFile {
            name: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    /// Resolve a fully-qualified protobuf type name (leading dot included).
    pub fn resolve(&self, type_name: &str, referenced_by: &str) -> Result<&ResolvedType> {
        self.types.get(type_name).ok_or_else(|| Error::MissingType {
            name: type_name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }
}

/// Class path of a type declared inside `parent`.
pub fn qualify(parent: Option<&str>, ident: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{ident}"),
        None => ident.to_string(),
    }
}
