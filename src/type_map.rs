//! Maps protobuf field types to Delphi runtime types, wire codecs, and units.
//!
//! # Type Mapping Table
//!
//! | Proto type | Delphi type | Wire codec | Default |
//! |-----------|-------------|------------|---------|
//! | `double` | `Double` | `gProtobufWireCodecDouble` | `0.0` |
//! | `float` | `Single` | `gProtobufWireCodecFloat` | `0.0` |
//! | `int32`, `sint32`, `sfixed32` | `Int32` | per type | `0` |
//! | `int64`, `sint64`, `sfixed64` | `Int64` | per type | `0` |
//! | `uint32`, `fixed32` | `UInt32` | per type | `0` |
//! | `uint64`, `fixed64` | `UInt64` | per type | `0` |
//! | `bool` | `Boolean` | `gProtobufWireCodecBool` | `False` |
//! | `string` | `UnicodeString` | `gProtobufWireCodecString` | `''` |
//! | `bytes` | `TBytes` | `gProtobufWireCodecBytes` | `nil` |
//! | enum | the enum type (public), `TProtobufEnumFieldValue` (backing) | `gProtobufWireCodecEnum` | `0` |
//! | message | the message class | none, messages encode themselves | `nil` |
//!
//! The shape of the table is fixed. Only the runtime namespace that prefixes
//! every runtime unit varies: the reference runtime lives under
//! [`DEFAULT_RUNTIME_NAMESPACE`], a custom runtime is selected with the
//! `runtime_namespace` plugin option.

use prost_types::field_descriptor_proto::Type;

use crate::error::{Error, Result};
use crate::schema::{FieldType, Label};

/// Namespace of the reference Delphi runtime library.
pub const DEFAULT_RUNTIME_NAMESPACE: &str = "Protobuf.Delphi";

/// RTL unit declaring `TStream` and `TPersistent`.
pub const CLASSES_UNIT: &str = "Classes";

/// RTL unit declaring `TBytes`.
pub const SYSUTILS_UNIT: &str = "SysUtils";

/// Map a descriptor type tag onto the supported [`FieldType`] set.
///
/// `field` is the qualified field name, used for error reporting only.
/// `type_name` is the descriptor's `type_name`, required for enum and
/// message fields.
pub fn field_type(field: &str, type_id: i32, type_name: &str) -> Result<FieldType> {
    let unimplemented = || Error::UnimplementedFieldType {
        field: field.to_string(),
        type_id,
    };
    let referenced = || {
        if type_name.is_empty() {
            Err(Error::InvalidSchema(format!(
                "field '{field}' references a type without a name"
            )))
        } else {
            Ok(type_name.to_string())
        }
    };

    let field_type = match Type::try_from(type_id).map_err(|_| unimplemented())? {
        Type::Double => FieldType::Double,
        Type::Float => FieldType::Float,
        Type::Int32 => FieldType::Int32,
        Type::Int64 => FieldType::Int64,
        Type::Uint32 => FieldType::Uint32,
        Type::Uint64 => FieldType::Uint64,
        Type::Sint32 => FieldType::Sint32,
        Type::Sint64 => FieldType::Sint64,
        Type::Fixed32 => FieldType::Fixed32,
        Type::Fixed64 => FieldType::Fixed64,
        Type::Sfixed32 => FieldType::Sfixed32,
        Type::Sfixed64 => FieldType::Sfixed64,
        Type::Bool => FieldType::Bool,
        Type::String => FieldType::String,
        Type::Bytes => FieldType::Bytes,
        Type::Enum => FieldType::Enum(referenced()?),
        Type::Message => FieldType::Message(referenced()?),
        Type::Group => return Err(unimplemented()),
    };
    Ok(field_type)
}

/// How values of a type are stored and compared in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain value type compared against its default literal.
    Scalar,
    /// Dynamic byte array; absent when empty.
    Bytes,
    /// Stored as its ordinal, exposed as the enum type.
    Enum,
    /// Owned object reference; absent when `nil`.
    Message,
}

/// Everything generated code needs to know about one field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSupport {
    /// Type exposed by the public property.
    pub public_type: String,

    /// Type of the private backing field. Differs from `public_type` for enums.
    pub internal_type: String,

    /// Global wire codec variable, `None` for messages.
    pub wire_codec: Option<String>,

    /// Default (absent) value literal of the internal type.
    pub default_value: &'static str,

    pub kind: ValueKind,

    /// Units required by a singular field of this type.
    pub singular_units: Vec<String>,

    /// Units required by a repeated field of this type.
    pub repeated_units: Vec<String>,
}

impl TypeSupport {
    /// Units a field with the given label needs in its unit's `uses` clause.
    pub fn units(&self, label: Label) -> &[String] {
        match label {
            Label::Singular => &self.singular_units,
            Label::Repeated => &self.repeated_units,
        }
    }

    /// Collection type exposed by a repeated property.
    pub fn repeated_public_type(&self) -> String {
        repeated_collection(self.kind, &self.public_type)
    }

    /// Collection type of a repeated backing field.
    pub fn repeated_internal_type(&self) -> String {
        repeated_collection(self.kind, &self.internal_type)
    }

    /// Boolean expression that is true when `value` differs from the type's
    /// default, i.e. when a no-presence field counts as present.
    pub fn presence_expression(&self, value: &str) -> String {
        match self.kind {
            ValueKind::Message => format!("Assigned({value})"),
            ValueKind::Bytes => format!("(Length({value}) > 0)"),
            ValueKind::Scalar | ValueKind::Enum => format!("({value} <> {})", self.default_value),
        }
    }

    /// Expression converting a backing value into the public type.
    pub fn to_public(&self, value: &str) -> String {
        match self.kind {
            ValueKind::Enum => format!("{}({value})", self.public_type),
            _ => value.to_string(),
        }
    }

    /// Expression converting a public value into the backing type.
    pub fn to_internal(&self, value: &str) -> String {
        match self.kind {
            ValueKind::Enum => format!("Ord({value})"),
            _ => value.to_string(),
        }
    }
}

fn repeated_collection(kind: ValueKind, element: &str) -> String {
    match kind {
        ValueKind::Message => format!("TProtobufRepeatedMessageField<{element}>"),
        _ => format!("TProtobufRepeatedField<{element}>"),
    }
}

/// Runtime naming scheme: which units and identifiers the generated code
/// binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSupport {
    namespace: String,
}

impl Default for RuntimeSupport {
    fn default() -> Self {
        Self::reference()
    }
}

impl RuntimeSupport {
    /// The reference runtime under [`DEFAULT_RUNTIME_NAMESPACE`].
    pub fn reference() -> Self {
        Self::custom(DEFAULT_RUNTIME_NAMESPACE)
    }

    /// A runtime with the same layout under another unit namespace.
    pub fn custom(namespace: impl Into<String>) -> Self {
        RuntimeSupport {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn unit(&self, name: &str) -> String {
        format!("{}.{name}", self.namespace)
    }

    /// Unit declaring `TProtobufFieldNumber` and `EProtobufInvalidOperation`.
    pub fn core_unit(&self) -> String {
        self.unit("uProtobuf")
    }

    /// Unit declaring `TProtobufMessage`.
    pub fn message_unit(&self) -> String {
        self.unit("uProtobufMessage")
    }

    /// Unit declaring the repeated field collections.
    pub fn repeated_field_unit(&self) -> String {
        self.unit("uProtobufRepeatedField")
    }

    /// Unit declaring `TProtobufEnumFieldValue` and the enum wire codec.
    pub fn enum_unit(&self) -> String {
        self.unit("uProtobufEnum")
    }

    /// Units every generated message unit depends on.
    pub fn base_units(&self) -> Vec<String> {
        vec![
            CLASSES_UNIT.to_string(),
            self.core_unit(),
            self.message_unit(),
        ]
    }

    /// Resolve the runtime support for a field type.
    ///
    /// `referenced` is the Delphi type identifier of the enum or message a
    /// field refers to; it is ignored for scalar types.
    pub fn support(&self, field_type: &FieldType, referenced: Option<&str>) -> Result<TypeSupport> {
        let (public, codec, default_value) = match field_type {
            FieldType::Double => ("Double", "Double", "0.0"),
            FieldType::Float => ("Single", "Float", "0.0"),
            FieldType::Int32 => ("Int32", "Int32", "0"),
            FieldType::Int64 => ("Int64", "Int64", "0"),
            FieldType::Uint32 => ("UInt32", "Uint32", "0"),
            FieldType::Uint64 => ("UInt64", "Uint64", "0"),
            FieldType::Sint32 => ("Int32", "Sint32", "0"),
            FieldType::Sint64 => ("Int64", "Sint64", "0"),
            FieldType::Fixed32 => ("UInt32", "Fixed32", "0"),
            FieldType::Fixed64 => ("UInt64", "Fixed64", "0"),
            FieldType::Sfixed32 => ("Int32", "Sfixed32", "0"),
            FieldType::Sfixed64 => ("Int64", "Sfixed64", "0"),
            FieldType::Bool => ("Boolean", "Bool", "False"),
            FieldType::String => ("UnicodeString", "String", "''"),
            FieldType::Bytes => ("TBytes", "Bytes", "nil"),
            FieldType::Enum(name) => {
                let public = require_reference(name, referenced)?;
                let unit = self.enum_unit();
                return Ok(TypeSupport {
                    public_type: public.to_string(),
                    internal_type: "TProtobufEnumFieldValue".to_string(),
                    wire_codec: Some("gProtobufWireCodecEnum".to_string()),
                    default_value: "0",
                    kind: ValueKind::Enum,
                    singular_units: vec![unit.clone()],
                    repeated_units: vec![unit, self.repeated_field_unit()],
                });
            }
            FieldType::Message(name) => {
                let class = require_reference(name, referenced)?;
                return Ok(TypeSupport {
                    public_type: class.to_string(),
                    internal_type: class.to_string(),
                    wire_codec: None,
                    default_value: "nil",
                    kind: ValueKind::Message,
                    singular_units: vec![self.message_unit()],
                    repeated_units: vec![self.message_unit(), self.repeated_field_unit()],
                });
            }
        };

        let kind = if matches!(field_type, FieldType::Bytes) {
            ValueKind::Bytes
        } else {
            ValueKind::Scalar
        };

        let mut singular_units = Vec::new();
        if kind == ValueKind::Bytes {
            singular_units.push(SYSUTILS_UNIT.to_string());
        }
        singular_units.push(self.unit(&format!("uProtobuf{codec}")));
        let mut repeated_units = singular_units.clone();
        repeated_units.push(self.repeated_field_unit());

        Ok(TypeSupport {
            public_type: public.to_string(),
            internal_type: public.to_string(),
            wire_codec: Some(format!("gProtobufWireCodec{codec}")),
            default_value,
            kind,
            singular_units,
            repeated_units,
        })
    }
}

fn require_reference<'a>(name: &str, referenced: Option<&'a str>) -> Result<&'a str> {
    referenced.ok_or_else(|| Error::MissingType {
        name: name.to_string(),
        referenced_by: "field type mapping".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_tags_map_to_field_types() {
        assert_eq!(
            field_type("M.a", Type::Int32 as i32, "").unwrap(),
            FieldType::Int32
        );
        assert_eq!(
            field_type("M.b", Type::Sfixed64 as i32, "").unwrap(),
            FieldType::Sfixed64
        );
        assert_eq!(
            field_type("M.c", Type::Enum as i32, ".pkg.Color").unwrap(),
            FieldType::Enum(".pkg.Color".to_string())
        );
        assert_eq!(
            field_type("M.d", Type::Message as i32, ".pkg.Point").unwrap(),
            FieldType::Message(".pkg.Point".to_string())
        );
    }

    #[test]
    fn groups_and_unknown_tags_are_unimplemented() {
        let err = field_type("M.g", Type::Group as i32, ".M.G").unwrap_err();
        assert!(matches!(err, Error::UnimplementedFieldType { .. }));

        let err = field_type("M.x", 99, "").unwrap_err();
        assert!(err.to_string().contains("unimplemented type 99"));
    }

    #[test]
    fn message_without_type_name_is_invalid() {
        let err = field_type("M.m", Type::Message as i32, "").unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn scalar_support() {
        let runtime = RuntimeSupport::reference();
        let int32 = runtime.support(&FieldType::Sint32, None).unwrap();
        assert_eq!(int32.public_type, "Int32");
        assert_eq!(int32.internal_type, "Int32");
        assert_eq!(int32.wire_codec.as_deref(), Some("gProtobufWireCodecSint32"));
        assert_eq!(int32.default_value, "0");
        assert_eq!(
            int32.units(Label::Singular),
            ["Protobuf.Delphi.uProtobufSint32".to_string()]
        );
        assert_eq!(
            int32.units(Label::Repeated),
            [
                "Protobuf.Delphi.uProtobufSint32".to_string(),
                "Protobuf.Delphi.uProtobufRepeatedField".to_string(),
            ]
        );
        assert_eq!(int32.repeated_public_type(), "TProtobufRepeatedField<Int32>");
        assert_eq!(int32.presence_expression("FX"), "(FX <> 0)");
    }

    #[test]
    fn bytes_need_sysutils_and_length_presence() {
        let bytes = RuntimeSupport::reference()
            .support(&FieldType::Bytes, None)
            .unwrap();
        assert_eq!(bytes.public_type, "TBytes");
        assert_eq!(bytes.singular_units[0], SYSUTILS_UNIT);
        assert_eq!(bytes.presence_expression("FData"), "(Length(FData) > 0)");
    }

    #[test]
    fn enum_support_boxes_backing_value() {
        let runtime = RuntimeSupport::reference();
        let color = runtime
            .support(&FieldType::Enum(".pkg.Color".to_string()), Some("TColor"))
            .unwrap();
        assert_eq!(color.public_type, "TColor");
        assert_eq!(color.internal_type, "TProtobufEnumFieldValue");
        assert_eq!(color.to_public("FColor"), "TColor(FColor)");
        assert_eq!(color.to_internal("aValue"), "Ord(aValue)");
        assert_eq!(
            color.repeated_internal_type(),
            "TProtobufRepeatedField<TProtobufEnumFieldValue>"
        );
        assert_eq!(color.repeated_public_type(), "TProtobufRepeatedField<TColor>");
    }

    #[test]
    fn message_support_has_no_codec() {
        let runtime = RuntimeSupport::reference();
        let point = runtime
            .support(&FieldType::Message(".pkg.Point".to_string()), Some("TPoint"))
            .unwrap();
        assert_eq!(point.wire_codec, None);
        assert_eq!(point.default_value, "nil");
        assert_eq!(point.presence_expression("FOrigin"), "Assigned(FOrigin)");
        assert_eq!(
            point.repeated_public_type(),
            "TProtobufRepeatedMessageField<TPoint>"
        );
    }

    #[test]
    fn message_support_requires_reference() {
        let err = RuntimeSupport::reference()
            .support(&FieldType::Message(".pkg.Point".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingType { .. }));
    }

    #[test]
    fn custom_namespace_only_changes_unit_names() {
        let reference = RuntimeSupport::reference();
        let custom = RuntimeSupport::custom("Acme.Proto");
        let a = reference.support(&FieldType::Bool, None).unwrap();
        let b = custom.support(&FieldType::Bool, None).unwrap();

        assert_eq!(a.public_type, b.public_type);
        assert_eq!(a.wire_codec, b.wire_codec);
        assert_eq!(b.singular_units, vec!["Acme.Proto.uProtobufBool".to_string()]);
        assert_eq!(custom.message_unit(), "Acme.Proto.uProtobufMessage");
        assert_eq!(
            custom.base_units(),
            vec![
                "Classes".to_string(),
                "Acme.Proto.uProtobuf".to_string(),
                "Acme.Proto.uProtobufMessage".to_string(),
            ]
        );
    }
}
