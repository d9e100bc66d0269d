//! One Delphi unit per schema file.

use serde::Serialize;

use crate::ast::{TypeDeclaration, Unit};
use crate::codegen::enums::enum_declaration;
use crate::codegen::message::{MessageScope, generate_message};
use crate::codegen::{Context, TypeIndex, UsesList, names};
use crate::error::Result;
use crate::schema::SchemaFile;
use crate::type_map::RuntimeSupport;

/// Name of the unit generated for a schema file.
///
/// The namespace comes from the package (`com.example` becomes
/// `Com.Example`), or from the file's directories when there is no package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitIdentifier {
    pub namespace: Vec<String>,
    pub name: String,
}

impl UnitIdentifier {
    pub fn for_file(file: &SchemaFile) -> Result<Self> {
        let reserved = names::keywords();
        let segments: Vec<&str> = match &file.package {
            Some(package) => package.split('.').filter(|s| !s.is_empty()).collect(),
            None => file.directory_segments(),
        };
        let namespace = segments
            .into_iter()
            .map(|segment| names::UNIT_NAMESPACE.generate(segment, &[], &reserved))
            .collect::<Result<Vec<_>>>()?;

        Ok(UnitIdentifier {
            namespace,
            name: names::UNIT_NAME.generate(file, &[], &reserved)?,
        })
    }

    /// Dotted unit name, e.g. `Com.Example.uPoint`.
    pub fn full_name(&self) -> String {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Output file path relative to the output root, e.g.
    /// `Com/Example/Com.Example.uPoint.pas`.
    pub fn output_path(&self) -> String {
        let file = format!("{}.pas", self.full_name());
        if self.namespace.is_empty() {
            file
        } else {
            format!("{}/{file}", self.namespace.join("/"))
        }
    }
}

/// Build the unit for `file`.
///
/// `index` must cover `file` and everything it imports.
pub fn generate_unit(file: &SchemaFile, index: &TypeIndex, runtime: &RuntimeSupport) -> Result<Unit> {
    let unit_name = index.unit(&file.name, &file.name)?.full_name();
    log::debug!("generating unit {unit_name} from {}", file.name);

    let ctx = Context {
        index,
        runtime,
        unit: &unit_name,
    };

    let mut uses = UsesList::default();
    uses.extend(runtime.base_units());
    for dependency in &file.dependencies {
        uses.add(index.unit(dependency, &file.name)?.full_name());
    }

    let mut types = file
        .enums
        .iter()
        .map(|enum_type| Ok(TypeDeclaration::Enum(enum_declaration(enum_type)?)))
        .collect::<Result<Vec<_>>>()?;

    let proto_scope = match &file.package {
        Some(package) => format!(".{package}"),
        None => String::new(),
    };
    let messages = file
        .messages
        .iter()
        .map(|message| {
            generate_message(
                message,
                MessageScope {
                    proto_scope: &proto_scope,
                    parent_class: None,
                },
                &ctx,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    types.extend(messages.iter().map(|generated| TypeDeclaration::ForwardClass {
        name: generated.declaration.name.clone(),
    }));

    let mut implementation = Vec::new();
    for generated in messages {
        types.push(TypeDeclaration::Class(generated.declaration));
        implementation.extend(generated.implementation);
        uses.extend(generated.uses.into_vec());
    }

    Ok(Unit {
        name: unit_name,
        header: vec![
            format!("Generated by protoc-gen-delphi from {}.", file.name),
            "Do not edit.".to_string(),
        ],
        uses: uses.into_vec(),
        types,
        implementation,
    })
}
