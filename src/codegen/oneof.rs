//! Oneof case types and the case-tracking property.
//!
//! A oneof with members `f1..fn` becomes a nested scoped enum with value 0
//! for "none" followed by one value per member in declaration order, plus a
//! backing field holding the current case. The case setter is the only place
//! that changes the case: it releases the storage of the member leaving the
//! oneof, stores the new case, then initializes the storage of the member
//! entering it. Member presence setters delegate to the case property, so the
//! case and the member presence bits never disagree.

use crate::ast::{
    Binding, CaseArm, ClassMember, EnumDeclaration, EnumValueDeclaration, MemberKind,
    MethodImplementation, MethodInterface, Parameter, Statement, TypeDeclaration, Visibility,
};
use crate::codegen::field::FieldGenerator;
use crate::codegen::names::{self, CaseMember};
use crate::error::Result;
use crate::ident::ReservedIdentifiers;
use crate::schema::{Field, Oneof};

/// Identifiers of one oneof, computed before any member field is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofNames {
    /// Name in the `.proto` file.
    pub proto_name: String,

    /// Tracks presence of a single proto3 `optional` field.
    pub synthetic: bool,
    pub case_type: String,
    pub backing: String,
    pub property: String,
    pub getter: String,
    pub setter: String,
    pub none_value: String,

    /// `(field number, case value)` per member, in declaration order.
    members: Vec<(i32, String)>,
}

impl OneofNames {
    /// Class-level names are claimed in `scope`; case values live in the
    /// case enum's own scope.
    pub fn generate(
        oneof: &Oneof,
        members: &[&Field],
        scope: &mut ReservedIdentifiers,
    ) -> Result<Self> {
        let mut values = names::keywords();
        let none_value = names::ONEOF_CASE_NONE.claim(oneof, &[], &mut values)?;

        let case_value = names::oneof_case_value();
        let mut member_values = Vec::with_capacity(members.len());
        for field in members {
            let value = case_value.claim(&CaseMember { oneof, field }, &[], &mut values)?;
            member_values.push((field.number, value));
        }

        Ok(OneofNames {
            proto_name: oneof.name.clone(),
            synthetic: oneof.synthetic,
            case_type: names::ONEOF_CASE_TYPE.claim(oneof, &[], scope)?,
            backing: names::ONEOF_BACKING.claim(oneof, &[], scope)?,
            property: names::ONEOF_PROPERTY.claim(oneof, names::PROPERTY_COLLIDING, scope)?,
            getter: names::ONEOF_GETTER.claim(oneof, names::GETTER_COLLIDING, scope)?,
            setter: names::ONEOF_SETTER.claim(oneof, names::SETTER_COLLIDING, scope)?,
            none_value,
            members: member_values,
        })
    }

    /// `TChoiceCase.ChoiceCaseA` for `ChoiceCaseA`.
    pub fn qualify(&self, value: &str) -> String {
        format!("{}.{value}", self.case_type)
    }

    /// Case value selecting the member with `field_number`.
    pub fn case_value(&self, field_number: i32) -> Option<&str> {
        self.members
            .iter()
            .find(|(number, _)| *number == field_number)
            .map(|(_, value)| value.as_str())
    }

    fn summary(&self) -> String {
        if self.synthetic {
            format!(
                "Presence of optional field <c>{}</c>.",
                self.proto_name.trim_start_matches('_')
            )
        } else {
            format!("Selected member of oneof <c>{}</c>.", self.proto_name)
        }
    }

    /// The case enum: none first, then one value per member.
    pub fn case_enum(&self) -> EnumDeclaration {
        let values = std::iter::once(&self.none_value)
            .chain(self.members.iter().map(|(_, value)| value))
            .zip(0..)
            .map(|(name, ordinal)| EnumValueDeclaration {
                name: name.clone(),
                ordinal,
            })
            .collect();
        EnumDeclaration {
            name: self.case_type.clone(),
            comment: vec![
                "<summary>".to_string(),
                self.summary(),
                "</summary>".to_string(),
            ],
            values,
        }
    }
}

pub struct OneofGenerator<'a> {
    names: &'a OneofNames,
    class_name: &'a str,
    members: Vec<&'a FieldGenerator<'a>>,
}

impl<'a> OneofGenerator<'a> {
    pub fn new(
        names: &'a OneofNames,
        class_name: &'a str,
        members: Vec<&'a FieldGenerator<'a>>,
    ) -> Self {
        OneofGenerator {
            names,
            class_name,
            members,
        }
    }

    fn getter_interface(&self) -> MethodInterface {
        MethodInterface::function(&self.names.getter, &self.names.case_type)
            .with_binding(Binding::Virtual)
    }

    fn setter_interface(&self) -> MethodInterface {
        MethodInterface::procedure(
            &self.names.setter,
            vec![Parameter::new("aValue", &self.names.case_type)],
        )
        .with_binding(Binding::Virtual)
    }

    pub fn declarations(&self) -> Vec<ClassMember> {
        vec![
            ClassMember::new(
                Visibility::Public,
                MemberKind::NestedType(TypeDeclaration::Enum(self.names.case_enum())),
            ),
            ClassMember::new(
                Visibility::Private,
                MemberKind::Field {
                    name: self.names.backing.clone(),
                    type_name: self.names.case_type.clone(),
                },
            ),
            ClassMember::new(Visibility::Protected, MemberKind::Method(self.getter_interface())),
            ClassMember::new(Visibility::Protected, MemberKind::Method(self.setter_interface())),
            ClassMember::new(
                Visibility::Public,
                MemberKind::Property {
                    name: self.names.property.clone(),
                    type_name: self.names.case_type.clone(),
                    getter: self.names.getter.clone(),
                    setter: self.names.setter.clone(),
                },
            )
            .with_comment(vec![
                "<summary>".to_string(),
                self.property_summary(),
                "</summary>".to_string(),
                "<remarks>Changing the case releases the previous member and gives the new \
                 member its default value.</remarks>"
                    .to_string(),
            ]),
        ]
    }

    fn property_summary(&self) -> String {
        if self.names.synthetic {
            format!(
                "Whether optional field <c>{}</c> has been assigned.",
                self.names.proto_name.trim_start_matches('_')
            )
        } else {
            format!(
                "Member of oneof <c>{}</c> currently holding a value.",
                self.names.proto_name
            )
        }
    }

    pub fn implementations(&self) -> Vec<MethodImplementation> {
        vec![
            self.getter_interface().implement(
                self.class_name,
                vec![Statement::simple(format!("Result := {}", self.names.backing))],
            ),
            self.setter_interface()
                .implement(self.class_name, self.setter_body()),
        ]
    }

    fn setter_body(&self) -> Vec<Statement> {
        let backing = &self.names.backing;
        let arms = |storage: fn(&FieldGenerator<'a>) -> Vec<Statement>| -> Vec<CaseArm> {
            self.members
                .iter()
                .filter_map(|member| {
                    let value = self.names.case_value(member.field().number)?;
                    Some(CaseArm {
                        label: self.names.qualify(value),
                        body: storage(member),
                    })
                })
                .collect()
        };

        vec![Statement::if_then(
            format!("aValue <> {backing}"),
            vec![
                Statement::Case {
                    selector: backing.clone(),
                    arms: arms(FieldGenerator::release_statements),
                },
                Statement::simple(format!("{backing} := aValue")),
                Statement::Case {
                    selector: backing.clone(),
                    arms: arms(FieldGenerator::initialize_statements),
                },
            ],
        )]
    }

    /// Fragment of `Create`: start out with no member selected.
    pub fn create_statements(&self) -> Vec<Statement> {
        vec![Statement::simple(format!(
            "{} := {}",
            self.names.backing,
            self.names.qualify(&self.names.none_value)
        ))]
    }
}
