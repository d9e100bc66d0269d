//! Identifier templates for every kind of name a generated unit declares.
//!
//! Unprefixed kinds (properties) yield to the prefixed kinds sharing their
//! class scope, so that e.g. a field named `has_items` becomes `HasItems_`
//! rather than shadowing the presence property of a field named `items`.

use crate::error::Result;
use crate::ident::{CaseStyle, DELPHI_KEYWORDS, IdentifierTemplate, NamingRule, ReservedIdentifiers};
use crate::schema::{EnumType, EnumValue, Field, MessageType, Oneof, SchemaFile};

// ── Naming rules ───────────────────────────────────────────────────────

pub const BACKING_FIELD: NamingRule = NamingRule::new("backing field").prefix("F");
pub const PROPERTY: NamingRule = NamingRule::new("property");
pub const GETTER: NamingRule = NamingRule::new("getter").prefix("Get");
pub const SETTER: NamingRule = NamingRule::new("setter").prefix("Set");
pub const PRESENCE: NamingRule = NamingRule::new("presence property").prefix("Has");
pub const PRESENCE_GETTER: NamingRule = NamingRule::new("presence getter").prefix("GetHas");
pub const PRESENCE_SETTER: NamingRule = NamingRule::new("presence setter").prefix("SetHas");
pub const FIELD_NUMBER: NamingRule = NamingRule::new("field number constant")
    .prefix("PROTOBUF_FIELD_NUMBER_")
    .case(CaseStyle::ScreamingSnake);
pub const FIELD_NAME: NamingRule = NamingRule::new("field name constant")
    .prefix("PROTOBUF_FIELD_NAME_")
    .case(CaseStyle::ScreamingSnake);
pub const TYPE: NamingRule = NamingRule::new("type").prefix("T");
pub const CASE_TYPE: NamingRule = NamingRule::new("oneof case type").prefix("T").suffix("Case");
pub const CASE_VALUE: NamingRule = NamingRule::new("oneof case value");
pub const ENUM_VALUE: NamingRule = NamingRule::new("enum value");
pub const UNIT: NamingRule = NamingRule::new("unit").prefix("u");
pub const NAMESPACE_SEGMENT: NamingRule = NamingRule::new("namespace segment");

/// Rules a property name must not look like.
pub const PROPERTY_COLLIDING: &[NamingRule] = &[
    BACKING_FIELD,
    GETTER,
    SETTER,
    PRESENCE,
    PRESENCE_GETTER,
    PRESENCE_SETTER,
    TYPE,
];
pub const GETTER_COLLIDING: &[NamingRule] = &[PRESENCE_GETTER];
pub const SETTER_COLLIDING: &[NamingRule] = &[PRESENCE_SETTER];
pub const TYPE_COLLIDING: &[NamingRule] = &[CASE_TYPE];

// ── Templates ──────────────────────────────────────────────────────────

fn field_core(field: &Field) -> String {
    field.name.clone()
}

/// A synthetic oneof is named after its field's presence (`_x` becomes
/// `x_presence`) so its members never shadow the field's own.
fn oneof_core(oneof: &Oneof) -> String {
    if oneof.synthetic {
        format!("{}_presence", oneof.name.trim_start_matches('_'))
    } else {
        oneof.name.clone()
    }
}

fn oneof_none_core(oneof: &Oneof) -> String {
    format!("{}_case_none", oneof_core(oneof))
}

fn case_member_core(member: &CaseMember<'_>) -> String {
    format!("{}_case_{}", oneof_core(member.oneof), member.field.name)
}

fn message_core(message: &MessageType) -> String {
    message.name.clone()
}

fn enum_core(enum_type: &EnumType) -> String {
    enum_type.name.clone()
}

fn enum_value_core(value: &EnumValue) -> String {
    value.name.clone()
}

fn unit_core(file: &SchemaFile) -> String {
    file.stem().to_string()
}

fn segment_core(segment: &str) -> String {
    segment.to_string()
}

/// A oneof member, the entity a case value is named after.
pub struct CaseMember<'a> {
    pub oneof: &'a Oneof,
    pub field: &'a Field,
}

pub const FIELD_BACKING: IdentifierTemplate<Field> = IdentifierTemplate::new(field_core, BACKING_FIELD);
pub const FIELD_PROPERTY: IdentifierTemplate<Field> = IdentifierTemplate::new(field_core, PROPERTY);
pub const FIELD_GETTER: IdentifierTemplate<Field> = IdentifierTemplate::new(field_core, GETTER);
pub const FIELD_SETTER: IdentifierTemplate<Field> = IdentifierTemplate::new(field_core, SETTER);
pub const FIELD_PRESENCE: IdentifierTemplate<Field> = IdentifierTemplate::new(field_core, PRESENCE);
pub const FIELD_PRESENCE_GETTER: IdentifierTemplate<Field> =
    IdentifierTemplate::new(field_core, PRESENCE_GETTER);
pub const FIELD_PRESENCE_SETTER: IdentifierTemplate<Field> =
    IdentifierTemplate::new(field_core, PRESENCE_SETTER);
pub const FIELD_NUMBER_CONSTANT: IdentifierTemplate<Field> =
    IdentifierTemplate::new(field_core, FIELD_NUMBER);
pub const FIELD_NAME_CONSTANT: IdentifierTemplate<Field> =
    IdentifierTemplate::new(field_core, FIELD_NAME);

pub const ONEOF_CASE_TYPE: IdentifierTemplate<Oneof> = IdentifierTemplate::new(oneof_core, CASE_TYPE);
pub const ONEOF_BACKING: IdentifierTemplate<Oneof> = IdentifierTemplate::new(oneof_core, BACKING_FIELD);
pub const ONEOF_PROPERTY: IdentifierTemplate<Oneof> = IdentifierTemplate::new(oneof_core, PROPERTY);
pub const ONEOF_GETTER: IdentifierTemplate<Oneof> = IdentifierTemplate::new(oneof_core, GETTER);
pub const ONEOF_SETTER: IdentifierTemplate<Oneof> = IdentifierTemplate::new(oneof_core, SETTER);
pub const ONEOF_CASE_NONE: IdentifierTemplate<Oneof> =
    IdentifierTemplate::new(oneof_none_core, CASE_VALUE);

/// Template naming the case value of one oneof member.
pub fn oneof_case_value<'a>() -> IdentifierTemplate<CaseMember<'a>> {
    IdentifierTemplate::new(case_member_core, CASE_VALUE)
}

pub const MESSAGE_TYPE: IdentifierTemplate<MessageType> = IdentifierTemplate::new(message_core, TYPE);
pub const ENUM_TYPE: IdentifierTemplate<EnumType> = IdentifierTemplate::new(enum_core, TYPE);
pub const ENUM_VALUE_NAME: IdentifierTemplate<EnumValue> =
    IdentifierTemplate::new(enum_value_core, ENUM_VALUE);
pub const UNIT_NAME: IdentifierTemplate<SchemaFile> = IdentifierTemplate::new(unit_core, UNIT);
pub const UNIT_NAMESPACE: IdentifierTemplate<str> =
    IdentifierTemplate::new(segment_core, NAMESPACE_SEGMENT);

// ── Reserved identifiers ───────────────────────────────────────────────

/// Members every generated message class declares or inherits from
/// `TProtobufMessage`, `TPersistent` and `TObject`.
pub const MESSAGE_MEMBERS: &[&str] = &[
    "Create",
    "Destroy",
    "Free",
    "Clear",
    "Encode",
    "Decode",
    "MergeFrom",
    "Assign",
    "AssignTo",
    "ClearOwnFields",
    "MergeFromOwnFields",
    "AssignOwnFields",
    "HasUnparsedField",
    "EncodeAsSingularField",
    "DecodeAsUnknownSingularField",
    "DefineProperties",
    "GetNamePath",
    "ClassName",
    "ClassNameIs",
    "ClassType",
    "ClassParent",
    "ClassInfo",
    "InstanceSize",
    "InheritsFrom",
    "MethodAddress",
    "MethodName",
    "QualifiedClassName",
    "UnitName",
    "Equals",
    "GetHashCode",
    "ToString",
    "Dispatch",
    "FieldAddress",
    "AfterConstruction",
    "BeforeDestruction",
    "DefaultHandler",
    "NewInstance",
    "FreeInstance",
    "CleanupInstance",
    "InitInstance",
    "GetInterface",
    "DisposeOf",
    "Result",
    "Self",
];

/// Type names that generated types must not shadow.
pub const RESERVED_TYPES: &[&str] = &[
    "TObject",
    "TClass",
    "TPersistent",
    "TStream",
    "TBytes",
    "TList",
    "TComponent",
    "TInterfacedObject",
    "TProtobufMessage",
    "TProtobufRepeatedField",
    "TProtobufRepeatedMessageField",
    "TProtobufEnumFieldValue",
    "TProtobufFieldNumber",
];

pub fn keywords() -> ReservedIdentifiers {
    ReservedIdentifiers::new().with(DELPHI_KEYWORDS.iter().copied())
}

/// Reserved set for identifiers declared inside a message class.
pub fn member_reserved() -> ReservedIdentifiers {
    keywords().with(MESSAGE_MEMBERS.iter().copied())
}

/// Starting scope of one message class. Every identifier the class declares
/// (nested types, fields, oneofs) is added to it as it is generated, so a
/// later sibling that styles to an earlier one takes the collision suffix.
pub fn class_reserved() -> ReservedIdentifiers {
    member_reserved().with(RESERVED_TYPES.iter().copied())
}

/// Reserved set for generated type names.
pub fn type_reserved() -> ReservedIdentifiers {
    keywords().with(RESERVED_TYPES.iter().copied())
}

/// Delphi class name of a message, unqualified.
pub fn message_type_ident(message: &MessageType) -> Result<String> {
    MESSAGE_TYPE.generate(message, TYPE_COLLIDING, &type_reserved())
}

/// Delphi type name of an enum, unqualified.
pub fn enum_type_ident(enum_type: &EnumType) -> Result<String> {
    ENUM_TYPE.generate(enum_type, TYPE_COLLIDING, &type_reserved())
}
