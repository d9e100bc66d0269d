//! Message classes.

use std::collections::BTreeSet;

use crate::ast::{
    Binding, ClassDeclaration, ClassMember, MemberKind, MethodImplementation, MethodInterface,
    MethodKind, Parameter, Statement, TypeDeclaration, Visibility,
};
use crate::codegen::enums::enum_declaration;
use crate::codegen::field::{FieldGenerator, FieldNames, OneofMembership};
use crate::codegen::index::qualify;
use crate::codegen::oneof::{OneofGenerator, OneofNames};
use crate::codegen::{Context, UsesList, names};
use crate::error::{Error, Result};
use crate::schema::{Field, MessageType};

/// Base class of every generated message.
pub const MESSAGE_ANCESTOR: &str = "TProtobufMessage";

/// A message class with everything it needs outside the declaration.
#[derive(Debug, Clone)]
pub struct GeneratedMessage {
    pub declaration: ClassDeclaration,

    /// Method bodies of this class and its nested classes.
    pub implementation: Vec<MethodImplementation>,

    /// Units referenced by the fields of this class and its nested classes.
    pub uses: UsesList,
}

/// Where a message is declared.
#[derive(Debug, Clone, Copy)]
pub struct MessageScope<'a> {
    /// Fully-qualified protobuf name of the enclosing package or message
    /// (leading dot, or empty).
    pub proto_scope: &'a str,

    /// Class path of the enclosing class, `None` at unit level.
    pub parent_class: Option<&'a str>,
}

/// Position of a declaration block inside the class.
enum Slot {
    Field(usize),
    Oneof(usize),
}

pub fn generate_message(
    message: &MessageType,
    scope: MessageScope<'_>,
    ctx: &Context<'_>,
) -> Result<GeneratedMessage> {
    let ident = names::message_type_ident(message)?;
    let class_name = qualify(scope.parent_class, &ident);
    let full_name = format!("{}.{}", scope.proto_scope, message.name);
    log::debug!("generating {full_name} as {class_name}");

    let mut members = Vec::new();
    let mut implementation = Vec::new();
    let mut uses = UsesList::default();

    // ── Nested types ───────────────────────────────────────────────────

    for enum_type in &message.nested_enums {
        members.push(ClassMember::new(
            Visibility::Public,
            MemberKind::NestedType(TypeDeclaration::Enum(enum_declaration(enum_type)?)),
        ));
    }

    let nested_scope = MessageScope {
        proto_scope: &full_name,
        parent_class: Some(&class_name),
    };
    let nested = message
        .nested_messages
        .iter()
        .map(|nested| generate_message(nested, nested_scope, ctx))
        .collect::<Result<Vec<_>>>()?;
    for generated in &nested {
        members.push(ClassMember::new(
            Visibility::Public,
            MemberKind::NestedType(TypeDeclaration::ForwardClass {
                name: generated.declaration.name.clone(),
            }),
        ));
    }
    for generated in nested {
        members.push(ClassMember::new(
            Visibility::Public,
            MemberKind::NestedType(TypeDeclaration::Class(generated.declaration)),
        ));
        implementation.extend(generated.implementation);
        uses.extend(generated.uses.into_vec());
    }

    // ── Fields and oneofs ──────────────────────────────────────────────

    // Nested types first, then fields and oneofs in declaration order.
    let mut class_scope = names::class_reserved();
    for member in &members {
        class_scope.insert(member.name());
    }

    let field_idents = message
        .fields
        .iter()
        .map(|field| FieldNames::generate(field, &mut class_scope))
        .collect::<Result<Vec<_>>>()?;

    let oneof_names = message
        .oneofs
        .iter()
        .enumerate()
        .map(|(index, oneof)| {
            let members: Vec<&Field> = message.oneof_members(index).collect();
            OneofNames::generate(oneof, &members, &mut class_scope)
        })
        .collect::<Result<Vec<_>>>()?;

    let fields = message
        .fields
        .iter()
        .zip(field_idents)
        .map(|(field, idents)| {
            let membership = match field.oneof_index {
                None => None,
                Some(index) => {
                    let oneof = oneof_names.get(index).ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "field '{full_name}.{}' refers to undeclared oneof {index}",
                            field.name
                        ))
                    })?;
                    let case_value = oneof.case_value(field.number).ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "field '{full_name}.{}' is missing from oneof '{}'",
                            field.name, oneof.proto_name
                        ))
                    })?;
                    Some(OneofMembership { oneof, case_value })
                }
            };
            FieldGenerator::new(field, idents, &class_name, &full_name, membership, ctx)
        })
        .collect::<Result<Vec<_>>>()?;

    let oneofs: Vec<OneofGenerator<'_>> = oneof_names
        .iter()
        .enumerate()
        .map(|(index, names)| {
            let members = fields
                .iter()
                .filter(|generator| generator.field().oneof_index == Some(index))
                .collect();
            OneofGenerator::new(names, &class_name, members)
        })
        .collect();

    let slots = declaration_slots(message);
    for slot in &slots {
        match *slot {
            Slot::Oneof(index) => {
                members.extend(oneofs[index].declarations());
                implementation.extend(oneofs[index].implementations());
            }
            Slot::Field(index) => {
                members.extend(fields[index].declarations());
                implementation.extend(fields[index].implementations());
                uses.extend(fields[index].units().iter().cloned());
            }
        }
    }

    // ── Lifecycle skeleton ─────────────────────────────────────────────

    let lifecycle = Lifecycle {
        class_name: &class_name,
        fields: &fields,
    };

    let mut create = vec![Statement::simple("inherited Create")];
    for slot in &slots {
        match *slot {
            Slot::Oneof(index) => create.extend(oneofs[index].create_statements()),
            Slot::Field(index) => create.extend(fields[index].create_statements()),
        }
    }
    create.push(Statement::simple("ClearOwnFields"));

    let mut destroy: Vec<Statement> = fields
        .iter()
        .rev()
        .flat_map(FieldGenerator::destroy_statements)
        .collect();
    destroy.push(Statement::simple("inherited Destroy"));

    let own_parameter = || vec![Parameter::new("aSource", class_name.as_str())];
    let methods = [
        (
            Visibility::Public,
            special(MethodKind::Constructor, "Create"),
            Vec::new(),
            create,
        ),
        (
            Visibility::Public,
            special(MethodKind::Destructor, "Destroy"),
            Vec::new(),
            destroy,
        ),
        (
            Visibility::Public,
            MethodInterface::procedure("Clear", Vec::new()).with_binding(Binding::Override),
            Vec::new(),
            vec![
                Statement::simple("inherited Clear"),
                Statement::simple("ClearOwnFields"),
            ],
        ),
        (
            Visibility::Public,
            MethodInterface::procedure("Encode", vec![Parameter::new("aDest", "TStream")])
                .with_binding(Binding::Override),
            Vec::new(),
            lifecycle.chain("inherited Encode(aDest)", FieldGenerator::encode_statements),
        ),
        (
            Visibility::Public,
            MethodInterface::procedure("Decode", vec![Parameter::new("aSource", "TStream")])
                .with_binding(Binding::Override),
            Vec::new(),
            lifecycle.chain("inherited Decode(aSource)", FieldGenerator::decode_statements),
        ),
        (
            Visibility::Public,
            MethodInterface::procedure(
                "MergeFrom",
                vec![Parameter::new("aSource", MESSAGE_ANCESTOR)],
            )
            .with_binding(Binding::Override),
            vec![Parameter::new("lSource", class_name.as_str())],
            lifecycle.cast_and_delegate("MergeFrom", "MergeFromOwnFields"),
        ),
        (
            Visibility::Public,
            MethodInterface::procedure("Assign", vec![Parameter::new("aSource", "TPersistent")])
                .with_binding(Binding::Override),
            vec![Parameter::new("lSource", class_name.as_str())],
            lifecycle.cast_and_delegate("Assign", "AssignOwnFields"),
        ),
        (
            Visibility::Private,
            MethodInterface::procedure("ClearOwnFields", Vec::new()),
            Vec::new(),
            lifecycle.concat(FieldGenerator::clear_statements),
        ),
        (
            Visibility::Private,
            MethodInterface::procedure("MergeFromOwnFields", own_parameter()),
            Vec::new(),
            lifecycle.concat(FieldGenerator::merge_statements),
        ),
        (
            Visibility::Private,
            MethodInterface::procedure("AssignOwnFields", own_parameter()),
            Vec::new(),
            lifecycle.concat(FieldGenerator::assign_statements),
        ),
    ];

    for (visibility, interface, locals, body) in methods {
        let mut body = interface.implement(&class_name, body);
        body.locals = locals;
        implementation.push(body);
        members.push(ClassMember::new(visibility, MemberKind::Method(interface)));
    }

    check_unique_members(&full_name, &members)?;

    Ok(GeneratedMessage {
        declaration: ClassDeclaration {
            name: ident,
            ancestor: MESSAGE_ANCESTOR.to_string(),
            comment: vec![
                "<summary>".to_string(),
                format!(
                    "Protobuf message <c>{}</c>.",
                    full_name.trim_start_matches('.')
                ),
                "</summary>".to_string(),
            ],
            members,
        },
        implementation,
        uses,
    })
}

/// Fields in declaration order, each oneof placed just before its first
/// member. Oneofs without members go last.
fn declaration_slots(message: &MessageType) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(message.fields.len() + message.oneofs.len());
    let mut placed = vec![false; message.oneofs.len()];
    for (index, field) in message.fields.iter().enumerate() {
        if let Some(oneof) = field.oneof_index {
            if !placed[oneof] {
                placed[oneof] = true;
                slots.push(Slot::Oneof(oneof));
            }
        }
        slots.push(Slot::Field(index));
    }
    for (oneof, placed) in placed.into_iter().enumerate() {
        if !placed {
            slots.push(Slot::Oneof(oneof));
        }
    }
    slots
}

fn special(kind: MethodKind, name: &str) -> MethodInterface {
    MethodInterface {
        kind,
        ..MethodInterface::procedure(name, Vec::new())
    }
    .with_binding(Binding::Override)
}

/// Builds lifecycle bodies from per-field fragments.
struct Lifecycle<'g, 'a> {
    class_name: &'g str,
    fields: &'g [FieldGenerator<'a>],
}

impl<'a> Lifecycle<'_, 'a> {
    fn concat(&self, fragment: fn(&FieldGenerator<'a>) -> Vec<Statement>) -> Vec<Statement> {
        self.fields.iter().flat_map(fragment).collect()
    }

    fn chain(
        &self,
        inherited: &str,
        fragment: fn(&FieldGenerator<'a>) -> Vec<Statement>,
    ) -> Vec<Statement> {
        let mut body = vec![Statement::simple(inherited)];
        body.extend(self.concat(fragment));
        body
    }

    fn cast_and_delegate(&self, inherited: &str, own_fields: &str) -> Vec<Statement> {
        vec![
            Statement::simple(format!("lSource := aSource as {}", self.class_name)),
            Statement::simple(format!("inherited {inherited}(aSource)")),
            Statement::simple(format!("{own_fields}(lSource)")),
        ]
    }
}

/// Reject two members whose names differ only in case. Pascal identifiers are
/// case-insensitive, so such a class would not compile.
fn check_unique_members(message: &str, members: &[ClassMember]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for member in members {
        if matches!(
            member.kind,
            MemberKind::NestedType(TypeDeclaration::ForwardClass { .. })
        ) {
            continue;
        }
        if !seen.insert(member.name().to_ascii_lowercase()) {
            return Err(Error::IdentifierCollision {
                kind: "class member",
                entity: message.trim_start_matches('.').to_string(),
                identifier: member.name().to_string(),
            });
        }
    }
    Ok(())
}
