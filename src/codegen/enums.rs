//! Protobuf enums as Delphi enumerated types.

use crate::ast::{EnumDeclaration, EnumValueDeclaration};
use crate::codegen::names;
use crate::error::Result;
use crate::schema::EnumType;

/// Declare `enum_type`, keeping every declared ordinal as-is.
///
/// Value identifiers share one scope per enum: a value whose name styles to
/// an earlier sibling's identifier takes the collision suffix.
pub fn enum_declaration(enum_type: &EnumType) -> Result<EnumDeclaration> {
    let name = names::enum_type_ident(enum_type)?;
    let mut reserved = names::keywords();
    let mut values = Vec::with_capacity(enum_type.values.len());

    for value in &enum_type.values {
        let ident = names::ENUM_VALUE_NAME.claim(value, &[], &mut reserved)?;
        values.push(EnumValueDeclaration {
            name: ident,
            ordinal: value.number,
        });
    }

    Ok(EnumDeclaration {
        name,
        comment: vec![
            "<summary>".to_string(),
            format!("Protobuf enum <c>{}</c>.", enum_type.name),
            "</summary>".to_string(),
        ],
        values,
    })
}
