//! Per-field declarations, accessor bodies, and lifecycle fragments.
//!
//! A field contributes to its class:
//!
//! - public constants holding its number and name;
//! - a private backing field of the internal type;
//! - a protected virtual getter/setter pair and the public property over it;
//! - for singular fields, a presence property (`HasX`) with its own pair;
//! - statement fragments for each lifecycle method of the message.
//!
//! Outside a oneof, presence follows the proto3 no-presence rule: a field is
//! present when it differs from its default. Inside a oneof, presence is the
//! oneof case and every presence change routes through the case property.

use crate::ast::{
    Binding, ClassMember, MemberKind, MethodImplementation, MethodInterface, Parameter, Statement,
    Visibility,
};
use crate::codegen::index::TypeKind;
use crate::codegen::oneof::OneofNames;
use crate::codegen::{Context, names, pascal_string};
use crate::error::{Error, Result};
use crate::ident::ReservedIdentifiers;
use crate::schema::{Field, FieldType};
use crate::type_map::{TypeSupport, ValueKind};

/// Identifiers a field declares in its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub backing: String,
    pub property: String,
    pub getter: String,
    pub setter: String,
    pub number_constant: String,
    pub name_constant: String,

    /// `None` for repeated fields, which have no presence.
    pub presence: Option<PresenceNames>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceNames {
    pub property: String,
    pub getter: String,
    pub setter: String,
}

impl FieldNames {
    /// Generate the field's identifiers inside the class scope `scope`,
    /// claiming each one so that later siblings yield to it.
    pub fn generate(field: &Field, scope: &mut ReservedIdentifiers) -> Result<Self> {
        let backing = names::FIELD_BACKING.claim(field, &[], scope)?;
        let property = names::FIELD_PROPERTY.claim(field, names::PROPERTY_COLLIDING, scope)?;
        let getter = names::FIELD_GETTER.claim(field, names::GETTER_COLLIDING, scope)?;
        let setter = names::FIELD_SETTER.claim(field, names::SETTER_COLLIDING, scope)?;
        let presence = if field.is_repeated() {
            None
        } else {
            Some(PresenceNames {
                property: names::FIELD_PRESENCE.claim(field, &[], scope)?,
                getter: names::FIELD_PRESENCE_GETTER.claim(field, &[], scope)?,
                setter: names::FIELD_PRESENCE_SETTER.claim(field, &[], scope)?,
            })
        };

        Ok(FieldNames {
            backing,
            property,
            getter,
            setter,
            number_constant: names::FIELD_NUMBER_CONSTANT.claim(field, &[], scope)?,
            name_constant: names::FIELD_NAME_CONSTANT.claim(field, &[], scope)?,
            presence,
        })
    }
}

/// A field's place in its oneof.
#[derive(Debug, Clone, Copy)]
pub struct OneofMembership<'a> {
    pub oneof: &'a OneofNames,

    /// Unqualified case value selecting this field.
    pub case_value: &'a str,
}

impl OneofMembership<'_> {
    fn qualified_case(&self) -> String {
        self.oneof.qualify(self.case_value)
    }
}

pub struct FieldGenerator<'a> {
    field: &'a Field,
    class_name: &'a str,
    oneof: Option<OneofMembership<'a>>,
    support: TypeSupport,
    names: FieldNames,
    units: Vec<String>,
}

impl<'a> FieldGenerator<'a> {
    /// `class_name` is the qualified class path of the containing message,
    /// `message_name` its fully-qualified protobuf name.
    pub fn new(
        field: &'a Field,
        names: FieldNames,
        class_name: &'a str,
        message_name: &str,
        oneof: Option<OneofMembership<'a>>,
        ctx: &Context<'_>,
    ) -> Result<Self> {
        let qualified = format!("{message_name}.{}", field.name);
        let mut units = Vec::new();

        let reference = match &field.field_type {
            FieldType::Enum(type_name) | FieldType::Message(type_name) => {
                let resolved = ctx.index.resolve(type_name, &qualified)?;
                let expected = if field.field_type.is_message() {
                    TypeKind::Message
                } else {
                    TypeKind::Enum
                };
                if resolved.kind != expected {
                    return Err(Error::InvalidSchema(format!(
                        "field '{qualified}' declares '{type_name}' as {expected:?} but it is a {:?}",
                        resolved.kind
                    )));
                }
                if resolved.unit != ctx.unit {
                    units.push(resolved.unit.clone());
                }
                Some(resolved.reference_from(ctx.unit))
            }
            _ => None,
        };

        let support = ctx.runtime.support(&field.field_type, reference.as_deref())?;
        let mut all_units = support.units(field.label).to_vec();
        all_units.append(&mut units);

        Ok(FieldGenerator {
            field,
            class_name,
            oneof,
            names,
            support,
            units: all_units,
        })
    }

    pub fn field(&self) -> &Field {
        self.field
    }

    pub fn names(&self) -> &FieldNames {
        &self.names
    }

    pub fn support(&self) -> &TypeSupport {
        &self.support
    }

    /// Units the field's types live in.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    fn public_type(&self) -> String {
        if self.field.is_repeated() {
            self.support.repeated_public_type()
        } else {
            self.support.public_type.clone()
        }
    }

    fn internal_type(&self) -> String {
        if self.field.is_repeated() {
            self.support.repeated_internal_type()
        } else {
            self.support.internal_type.clone()
        }
    }

    fn is_message(&self) -> bool {
        self.support.kind == ValueKind::Message
    }

    /// Presence property name. Only called for singular fields.
    fn has(&self) -> &str {
        self.names
            .presence
            .as_ref()
            .map_or(self.names.property.as_str(), |presence| presence.property.as_str())
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn getter_interface(&self) -> MethodInterface {
        MethodInterface::function(&self.names.getter, self.public_type()).with_binding(Binding::Virtual)
    }

    fn setter_interface(&self) -> MethodInterface {
        MethodInterface::procedure(
            &self.names.setter,
            vec![Parameter::new("aValue", self.public_type())],
        )
        .with_binding(Binding::Virtual)
    }

    fn presence_interfaces(&self) -> Option<(MethodInterface, MethodInterface)> {
        self.names.presence.as_ref().map(|presence| {
            (
                MethodInterface::function(&presence.getter, "Boolean").with_binding(Binding::Virtual),
                MethodInterface::procedure(
                    &presence.setter,
                    vec![Parameter::new("aValue", "Boolean")],
                )
                .with_binding(Binding::Virtual),
            )
        })
    }

    /// Members in declaration order: constants, backing field, accessors,
    /// properties.
    pub fn declarations(&self) -> Vec<ClassMember> {
        let mut members = vec![
            ClassMember::new(
                Visibility::Public,
                MemberKind::Constant {
                    name: self.names.number_constant.clone(),
                    value: self.field.number.to_string(),
                },
            ),
            ClassMember::new(
                Visibility::Public,
                MemberKind::Constant {
                    name: self.names.name_constant.clone(),
                    value: pascal_string(&self.field.name),
                },
            ),
            ClassMember::new(
                Visibility::Private,
                MemberKind::Field {
                    name: self.names.backing.clone(),
                    type_name: self.internal_type(),
                },
            ),
            ClassMember::new(Visibility::Protected, MemberKind::Method(self.getter_interface())),
            ClassMember::new(Visibility::Protected, MemberKind::Method(self.setter_interface())),
        ];

        let presence = self.presence_interfaces();
        if let Some((getter, setter)) = &presence {
            members.push(ClassMember::new(Visibility::Protected, MemberKind::Method(getter.clone())));
            members.push(ClassMember::new(Visibility::Protected, MemberKind::Method(setter.clone())));
        }

        members.push(
            ClassMember::new(
                Visibility::Public,
                MemberKind::Property {
                    name: self.names.property.clone(),
                    type_name: self.public_type(),
                    getter: self.names.getter.clone(),
                    setter: self.names.setter.clone(),
                },
            )
            .with_comment(self.property_comment()),
        );

        if let Some(names) = &self.names.presence {
            members.push(
                ClassMember::new(
                    Visibility::Public,
                    MemberKind::Property {
                        name: names.property.clone(),
                        type_name: "Boolean".to_string(),
                        getter: names.getter.clone(),
                        setter: names.setter.clone(),
                    },
                )
                .with_comment(self.presence_comment()),
            );
        }
        members
    }

    fn property_comment(&self) -> Vec<String> {
        let mut comment = vec![
            "<summary>".to_string(),
            format!(
                "Protobuf field <c>{} = {}</c> of type <c>{}{}</c>.",
                self.field.name,
                self.field.number,
                if self.field.is_repeated() {
                    "repeated "
                } else if self.field.proto3_optional {
                    "optional "
                } else {
                    ""
                },
                self.field.field_type.proto_name()
            ),
            "</summary>".to_string(),
        ];
        if self.field.is_repeated() {
            comment.push(
                "<remarks>The message owns the collection. Assigning a collection transfers its \
                 ownership to the message, which frees the previous one.</remarks>"
                    .to_string(),
            );
        } else if self.is_message() {
            comment.push(
                "<remarks>The message owns the instance. Assigning an instance transfers its \
                 ownership to the message, which frees the previous one.</remarks>"
                    .to_string(),
            );
        }
        if self.field.proto3_optional {
            comment.push(
                "<remarks>Declared <c>optional</c>: assigning a value marks the field present, \
                 even when it is the default.</remarks>"
                    .to_string(),
            );
        } else if let Some(oneof) = &self.oneof {
            comment.push(format!(
                "<remarks>Member of oneof <c>{}</c>. Assigning a value selects this member.</remarks>",
                oneof.oneof.proto_name
            ));
        }
        comment
    }

    fn presence_comment(&self) -> Vec<String> {
        let summary = match &self.oneof {
            Some(_) if self.field.proto3_optional => format!(
                "Whether <c>{}</c> has been assigned. Setting <c>True</c> assigns the default \
                 value, setting <c>False</c> clears it.",
                self.field.name
            ),
            Some(oneof) => format!(
                "Whether <c>{}</c> is the selected member of oneof <c>{}</c>. Setting <c>True</c> \
                 selects it with a default value, setting <c>False</c> clears the oneof.",
                self.field.name, oneof.oneof.proto_name
            ),
            None => format!(
                "Whether <c>{}</c> differs from its default value. Setting <c>False</c> resets it; \
                 setting <c>True</c> on an absent field raises <c>EProtobufInvalidOperation</c>.",
                self.field.name
            ),
        };
        vec!["<summary>".to_string(), summary, "</summary>".to_string()]
    }

    // ── Accessor bodies ────────────────────────────────────────────────

    pub fn implementations(&self) -> Vec<MethodImplementation> {
        let mut bodies = vec![
            self.getter_interface()
                .implement(self.class_name, self.getter_body()),
            self.setter_interface()
                .implement(self.class_name, self.setter_body()),
        ];
        if let Some((getter, setter)) = self.presence_interfaces() {
            bodies.push(getter.implement(self.class_name, self.presence_getter_body()));
            bodies.push(setter.implement(self.class_name, self.presence_setter_body()));
        }
        bodies
    }

    fn getter_body(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        let value = if self.field.is_repeated() {
            let public = self.public_type();
            if public == self.internal_type() {
                backing.clone()
            } else {
                format!("{public}({backing})")
            }
        } else {
            self.support.to_public(backing)
        };
        vec![Statement::simple(format!("Result := {value}"))]
    }

    fn setter_body(&self) -> Vec<Statement> {
        let backing = &self.names.backing;

        if self.field.is_repeated() {
            let internal = self.internal_type();
            let incoming = if internal == self.public_type() {
                "aValue".to_string()
            } else {
                format!("{internal}(aValue)")
            };
            return vec![Statement::if_then(
                format!("{incoming} <> {backing}"),
                vec![
                    Statement::simple(format!("{backing}.Free")),
                    Statement::simple(format!("{backing} := {incoming}")),
                ],
            )];
        }

        let has = self.has();
        match (self.is_message(), self.oneof.is_some()) {
            (true, false) => vec![Statement::if_then(
                format!("aValue <> {backing}"),
                vec![
                    Statement::simple(format!("{backing}.Free")),
                    Statement::simple(format!("{backing} := aValue")),
                ],
            )],
            (true, true) => vec![Statement::if_then_else(
                "aValue = nil",
                vec![Statement::simple(format!("{has} := False"))],
                vec![Statement::if_then(
                    format!("aValue <> {backing}"),
                    vec![
                        Statement::simple(format!("{has} := True")),
                        Statement::simple(format!("{backing}.Free")),
                        Statement::simple(format!("{backing} := aValue")),
                    ],
                )],
            )],
            (false, false) => vec![Statement::simple(format!(
                "{backing} := {}",
                self.support.to_internal("aValue")
            ))],
            (false, true) => vec![
                Statement::simple(format!("{has} := True")),
                Statement::simple(format!(
                    "{backing} := {}",
                    self.support.to_internal("aValue")
                )),
            ],
        }
    }

    fn presence_getter_body(&self) -> Vec<Statement> {
        let condition = match &self.oneof {
            Some(membership) => format!(
                "({} = {})",
                membership.oneof.backing,
                membership.qualified_case()
            ),
            None => self.support.presence_expression(&self.names.backing),
        };
        vec![Statement::simple(format!("Result := {condition}"))]
    }

    fn presence_setter_body(&self) -> Vec<Statement> {
        let has = self.has();
        match &self.oneof {
            Some(membership) => vec![Statement::if_then_else(
                "aValue",
                vec![Statement::if_then(
                    format!("not {has}"),
                    vec![Statement::simple(format!(
                        "{} := {}",
                        membership.oneof.property,
                        membership.qualified_case()
                    ))],
                )],
                vec![Statement::if_then(
                    has,
                    vec![Statement::simple(format!(
                        "{} := {}",
                        membership.oneof.property,
                        membership.oneof.qualify(&membership.oneof.none_value)
                    ))],
                )],
            )],
            None => vec![Statement::if_then_else(
                "aValue",
                vec![Statement::if_then(
                    format!("not {has}"),
                    vec![Statement::simple(format!(
                        "raise EProtobufInvalidOperation.Create({})",
                        pascal_string(&format!(
                            "Cannot mark field {} as present without assigning a value",
                            self.field.name
                        ))
                    ))],
                )],
                self.release_statements(),
            )],
        }
    }

    /// Free owned storage and reset the backing field to its default.
    pub fn release_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        if self.is_message() {
            vec![
                Statement::simple(format!("{backing}.Free")),
                Statement::simple(format!("{backing} := nil")),
            ]
        } else {
            vec![Statement::simple(format!(
                "{backing} := {}",
                self.support.default_value
            ))]
        }
    }

    /// Put a fresh default value into the backing field; messages get a new
    /// empty instance.
    pub fn initialize_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        if self.is_message() {
            vec![Statement::simple(format!(
                "{backing} := {}.Create",
                self.support.public_type
            ))]
        } else {
            vec![Statement::simple(format!(
                "{backing} := {}",
                self.support.default_value
            ))]
        }
    }

    // ── Lifecycle fragments ────────────────────────────────────────────

    pub fn create_statements(&self) -> Vec<Statement> {
        if self.field.is_repeated() {
            vec![Statement::simple(format!(
                "{} := {}.Create",
                self.names.backing,
                self.internal_type()
            ))]
        } else {
            Vec::new()
        }
    }

    pub fn destroy_statements(&self) -> Vec<Statement> {
        if self.field.is_repeated() || self.is_message() {
            vec![Statement::simple(format!("{}.Free", self.names.backing))]
        } else {
            Vec::new()
        }
    }

    pub fn clear_statements(&self) -> Vec<Statement> {
        if self.field.is_repeated() {
            vec![Statement::simple(format!("{}.Clear", self.names.backing))]
        } else {
            vec![Statement::simple(format!("{} := False", self.has()))]
        }
    }

    pub fn encode_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        let number = &self.names.number_constant;

        if self.field.is_repeated() {
            let call = match &self.support.wire_codec {
                Some(codec) => format!("{backing}.EncodeAsRepeatedField(aDest, {number}, {codec})"),
                None => format!("{backing}.EncodeAsRepeatedField(aDest, {number})"),
            };
            return vec![Statement::simple(call)];
        }

        let has = self.has();
        match &self.support.wire_codec {
            None => vec![Statement::if_then(
                has,
                vec![Statement::simple(format!(
                    "{backing}.EncodeAsSingularField(aDest, {number})"
                ))],
            )],
            Some(codec) if self.oneof.is_some() => vec![Statement::if_then(
                has,
                vec![Statement::simple(format!(
                    "{codec}.EncodeField({backing}, {number}, aDest)"
                ))],
            )],
            Some(codec) => vec![Statement::simple(format!(
                "{codec}.EncodeSingularField({backing}, {number}, aDest)"
            ))],
        }
    }

    pub fn decode_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        let number = &self.names.number_constant;

        if self.field.is_repeated() {
            let call = match &self.support.wire_codec {
                Some(codec) => {
                    format!("{backing}.DecodeAsUnknownRepeatedField(Self, {number}, {codec})")
                }
                None => format!("{backing}.DecodeAsUnknownRepeatedField(Self, {number})"),
            };
            return vec![Statement::simple(call)];
        }

        let property = &self.names.property;
        let present = match &self.support.wire_codec {
            None => vec![
                Statement::simple(format!("{property} := {}.Create", self.support.public_type)),
                Statement::simple(format!(
                    "{backing}.DecodeAsUnknownSingularField(Self, {number})"
                )),
            ],
            Some(codec) => vec![Statement::simple(format!(
                "{property} := {}",
                self.support
                    .to_public(&format!("{codec}.DecodeUnknownField(Self, {number})"))
            ))],
        };
        vec![Statement::if_then_else(
            format!("HasUnparsedField({number})"),
            present,
            vec![Statement::simple(format!("{} := False", self.has()))],
        )]
    }

    /// Fragment of `MergeFromOwnFields(aSource)`.
    pub fn merge_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        if self.field.is_repeated() {
            return vec![Statement::simple(format!(
                "{backing}.MergeFrom(aSource.{backing})"
            ))];
        }

        let has = self.has();
        let property = &self.names.property;
        let copy = if self.is_message() {
            vec![Statement::if_then_else(
                has,
                vec![Statement::simple(format!(
                    "{backing}.MergeFrom(aSource.{backing})"
                ))],
                self.deep_copy_statements(),
            )]
        } else {
            vec![Statement::simple(format!("{property} := aSource.{property}"))]
        };
        vec![Statement::if_then(format!("aSource.{has}"), copy)]
    }

    /// Fragment of `AssignOwnFields(aSource)`.
    pub fn assign_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        if self.field.is_repeated() {
            return vec![Statement::simple(format!(
                "{backing}.Assign(aSource.{backing})"
            ))];
        }

        let has = self.has();
        let property = &self.names.property;
        let copy = if self.is_message() {
            self.deep_copy_statements()
        } else {
            vec![Statement::simple(format!("{property} := aSource.{property}"))]
        };
        vec![Statement::if_then_else(
            format!("aSource.{has}"),
            copy,
            vec![Statement::simple(format!("{has} := False"))],
        )]
    }

    fn deep_copy_statements(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        vec![
            Statement::simple(format!(
                "{} := {}.Create",
                self.names.property, self.support.public_type
            )),
            Statement::simple(format!("{backing}.Assign(aSource.{backing})")),
        ]
    }
}
