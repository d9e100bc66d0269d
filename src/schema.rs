//! Protobuf schema model, descriptor conversion, and descriptor set loading.
//!
//! The compiler hands us `FileDescriptorProto`s. Before any identifier is
//! generated they are converted into an owned tree of [`SchemaFile`] /
//! [`MessageType`] nodes: nested messages are owned child lists, and a field
//! refers to its oneof by index into the containing message. The tree is never
//! mutated after conversion.

use std::collections::BTreeSet;
use std::path::Path;

use prost::Message as _;
use prost_types::field_descriptor_proto::Label as DescriptorLabel;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet,
};

use crate::error::{Error, Result};
use crate::type_map;

/// One `.proto` file. Exactly one Delphi unit is derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile {
    /// File name relative to the include root (e.g. `"shapes/point.proto"`).
    pub name: String,

    /// Declared package, if any (e.g. `"com.example.shapes"`).
    pub package: Option<String>,

    /// File names of direct imports, in declaration order.
    pub dependencies: Vec<String>,

    /// Top-level messages in declaration order.
    pub messages: Vec<MessageType>,

    /// Top-level enums in declaration order.
    pub enums: Vec<EnumType>,
}

/// A message definition with its nested definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageType {
    pub name: String,
    pub fields: Vec<Field>,
    pub oneofs: Vec<Oneof>,
    pub nested_messages: Vec<MessageType>,
    pub nested_enums: Vec<EnumType>,
}

/// A single message field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,

    /// Field number, unique within the containing message.
    pub number: i32,

    pub field_type: FieldType,
    pub label: Label,

    /// Index into the containing message's `oneofs`.
    pub oneof_index: Option<usize>,

    /// Declared `optional` in a proto3 file. Such a field is the only member
    /// of a synthetic oneof, which carries its presence.
    pub proto3_optional: bool,
}

/// The fixed set of field types the generator supports.
///
/// `Enum` and `Message` carry the fully-qualified protobuf type name
/// (leading dot included, e.g. `".com.example.Color"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum(String),
    Message(String),
}

/// Field cardinality as seen by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Optional/required/no-label fields: at most one value.
    Singular,
    Repeated,
}

/// A oneof declaration. Members are the fields whose `oneof_index` points here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof {
    pub name: String,

    /// Compiler-generated to track presence of a proto3 `optional` field.
    pub synthetic: bool,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValue>,
}

/// A single enum value. Ordinals need not be contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

impl SchemaFile {
    /// Convert a compiler-supplied file descriptor into the schema model.
    pub fn from_descriptor(file: &FileDescriptorProto) -> Result<Self> {
        let name = required_name(file.name(), "file")?;
        let package = file.package.clone().filter(|p| !p.is_empty());
        let scope = match &package {
            Some(package) => format!(".{package}"),
            None => String::new(),
        };

        if file.syntax() != "proto3" {
            log::warn!(
                "{name}: syntax '{}' treated with proto3 no-presence rules for non-oneof fields",
                if file.syntax().is_empty() { "proto2" } else { file.syntax() }
            );
        }

        let messages = file
            .message_type
            .iter()
            .map(|message| MessageType::from_descriptor(message, &scope))
            .collect::<Result<Vec<_>>>()?;
        let enums = file
            .enum_type
            .iter()
            .map(EnumType::from_descriptor)
            .collect::<Result<Vec<_>>>()?;

        Ok(SchemaFile {
            name,
            package,
            dependencies: file.dependency.clone(),
            messages,
            enums,
        })
    }

    /// File name without directories and without the `.proto` extension.
    pub fn stem(&self) -> &str {
        let base = self.name.rsplit('/').next().unwrap_or(&self.name);
        base.strip_suffix(".proto").unwrap_or(base)
    }

    /// Directory segments of the file name (`"a/b/c.proto"` yields `["a", "b"]`).
    pub fn directory_segments(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.name.split('/').filter(|s| !s.is_empty()).collect();
        segments.pop();
        segments
    }
}

impl MessageType {
    /// Convert a message descriptor. `scope` is the fully-qualified name of
    /// the enclosing package or message (leading dot, or empty).
    fn from_descriptor(message: &DescriptorProto, scope: &str) -> Result<Self> {
        let name = required_name(message.name(), "message")?;
        let full_name = format!("{scope}.{name}");

        let mut oneofs = message
            .oneof_decl
            .iter()
            .map(|oneof| {
                Ok(Oneof {
                    name: required_name(oneof.name(), "oneof")?,
                    synthetic: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let fields = message
            .field
            .iter()
            .map(|field| Field::from_descriptor(field, &full_name, oneofs.len()))
            .collect::<Result<Vec<_>>>()?;

        validate_fields(&full_name, &fields)?;

        for field in fields.iter().filter(|field| field.proto3_optional) {
            if let Some(index) = field.oneof_index {
                oneofs[index].synthetic = true;
            }
        }

        let nested_messages = message
            .nested_type
            .iter()
            .map(|nested| MessageType::from_descriptor(nested, &full_name))
            .collect::<Result<Vec<_>>>()?;
        let nested_enums = message
            .enum_type
            .iter()
            .map(EnumType::from_descriptor)
            .collect::<Result<Vec<_>>>()?;

        Ok(MessageType {
            name,
            fields,
            oneofs,
            nested_messages,
            nested_enums,
        })
    }

    /// Member fields of the oneof at `oneof_index`, in declaration order.
    pub fn oneof_members(&self, oneof_index: usize) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(move |field| field.oneof_index == Some(oneof_index))
    }
}

impl Field {
    fn from_descriptor(
        field: &FieldDescriptorProto,
        message_name: &str,
        oneof_count: usize,
    ) -> Result<Self> {
        let name = required_name(field.name(), "field")?;
        let qualified = format!("{message_name}.{name}");

        let field_type = type_map::field_type(
            &qualified,
            field.r#type.unwrap_or_default(),
            field.type_name(),
        )?;

        let label = match field.label() {
            DescriptorLabel::Repeated => Label::Repeated,
            DescriptorLabel::Optional | DescriptorLabel::Required => Label::Singular,
        };

        let oneof_index = match field.oneof_index {
            None => None,
            Some(index) => {
                let index = usize::try_from(index)
                    .ok()
                    .filter(|index| *index < oneof_count)
                    .ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "field '{qualified}' refers to undeclared oneof {index}"
                        ))
                    })?;
                Some(index)
            }
        };

        if field.proto3_optional() && oneof_index.is_none() {
            return Err(Error::InvalidSchema(format!(
                "optional field '{qualified}' has no synthetic oneof"
            )));
        }

        if field.number() <= 0 {
            return Err(Error::InvalidSchema(format!(
                "field '{qualified}' has non-positive number {}",
                field.number()
            )));
        }

        Ok(Field {
            name,
            number: field.number(),
            field_type,
            label,
            oneof_index,
            proto3_optional: field.proto3_optional(),
        })
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

impl FieldType {
    /// Fully-qualified protobuf name of a referenced enum or message type.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            FieldType::Enum(name) | FieldType::Message(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message(_))
    }

    /// Name as written in a `.proto` file, used in generated documentation.
    pub fn proto_name(&self) -> &str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Uint32 => "uint32",
            FieldType::Uint64 => "uint64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Enum(name) | FieldType::Message(name) => name.trim_start_matches('.'),
        }
    }
}

impl EnumType {
    fn from_descriptor(enum_type: &EnumDescriptorProto) -> Result<Self> {
        let name = required_name(enum_type.name(), "enum")?;
        let values = enum_type
            .value
            .iter()
            .map(|value| {
                Ok(EnumValue {
                    name: required_name(value.name(), "enum value")?,
                    number: value.number(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EnumType { name, values })
    }
}

/// Check the message-level invariants the generator relies on: unique field
/// numbers, no repeated field inside a oneof, and a synthetic oneof with a
/// single member.
fn validate_fields(message_name: &str, fields: &[Field]) -> Result<()> {
    let mut numbers = BTreeSet::new();
    for field in fields {
        if let (true, Some(index)) = (field.proto3_optional, field.oneof_index) {
            let members = fields.iter().filter(|f| f.oneof_index == Some(index)).count();
            if members != 1 {
                return Err(Error::InvalidSchema(format!(
                    "optional field '{message_name}.{}' shares its synthetic oneof",
                    field.name
                )));
            }
        }
        if !numbers.insert(field.number) {
            return Err(Error::InvalidSchema(format!(
                "message '{message_name}' declares field number {} more than once",
                field.number
            )));
        }
        if field.is_repeated() && field.oneof_index.is_some() {
            return Err(Error::InvalidSchema(format!(
                "repeated field '{message_name}.{}' cannot be a oneof member",
                field.name
            )));
        }
    }
    Ok(())
}

fn required_name(name: &str, what: &str) -> Result<String> {
    if name.is_empty() {
        Err(Error::InvalidSchema(format!("{what} without a name")))
    } else {
        Ok(name.to_string())
    }
}

/// Load a binary `FileDescriptorSet` from disk.
///
/// The file is what `protoc --include_imports --descriptor_set_out=<FILE>`
/// writes; imports must be included so cross-file references resolve.
pub fn load_descriptor_set(path: &Path) -> Result<Vec<FileDescriptorProto>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let set = FileDescriptorSet::decode(bytes.as_slice())?;
    Ok(set.file)
}
