//! Delphi abstract syntax tree produced by the generators.
//!
//! The tree carries declarations and statement structure only. Turning it
//! into text is the job of a renderer ([`crate::render`] is the one this
//! crate ships). Every node is `Serialize` so the tree can be dumped as JSON
//! for external renderers.

use serde::Serialize;

/// One generated Delphi unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    /// Fully dotted unit name (e.g. `"Com.Example.uPoint"`).
    pub name: String,

    /// Lines of the leading `//` comment block.
    pub header: Vec<String>,

    /// Interface `uses` clause, deduplicated and in first-use order.
    pub uses: Vec<String>,

    /// Declarations of the interface `type` section.
    pub types: Vec<TypeDeclaration>,

    /// Method bodies of the implementation section, in declaration order.
    pub implementation: Vec<MethodImplementation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDeclaration {
    /// `TFoo = class;`
    ForwardClass { name: String },
    Class(ClassDeclaration),
    Enum(EnumDeclaration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub name: String,
    pub ancestor: String,
    pub comment: Vec<String>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDeclaration {
    pub name: String,
    pub comment: Vec<String>,
    pub values: Vec<EnumValueDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDeclaration {
    pub name: String,
    pub ordinal: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassMember {
    pub visibility: Visibility,
    pub comment: Vec<String>,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum MemberKind {
    Constant {
        name: String,
        value: String,
    },
    Field {
        name: String,
        type_name: String,
    },
    Property {
        name: String,
        type_name: String,
        getter: String,
        setter: String,
    },
    Method(MethodInterface),
    NestedType(TypeDeclaration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Procedure,
    Function,
    Constructor,
    Destructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Static,
    Virtual,
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// A method signature as declared inside a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInterface {
    pub kind: MethodKind,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub binding: Binding,
}

/// A method body in the implementation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodImplementation {
    /// Qualified class path (e.g. `"TOuter.TInner"`).
    pub class_name: String,
    pub method: MethodInterface,
    pub locals: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum Statement {
    /// A single statement without its trailing semicolon.
    Simple { code: String },
    If {
        condition: String,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    Case {
        selector: String,
        arms: Vec<CaseArm>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseArm {
    pub label: String,
    pub body: Vec<Statement>,
}

impl Statement {
    pub fn simple(code: impl Into<String>) -> Self {
        Statement::Simple { code: code.into() }
    }

    pub fn if_then(condition: impl Into<String>, then_branch: Vec<Statement>) -> Self {
        Self::if_then_else(condition, then_branch, Vec::new())
    }

    pub fn if_then_else(
        condition: impl Into<String>,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    ) -> Self {
        Statement::If {
            condition: condition.into(),
            then_branch,
            else_branch,
        }
    }
}

impl MethodInterface {
    pub fn procedure(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        MethodInterface {
            kind: MethodKind::Procedure,
            name: name.into(),
            parameters,
            return_type: None,
            binding: Binding::Static,
        }
    }

    pub fn function(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        MethodInterface {
            kind: MethodKind::Function,
            name: name.into(),
            parameters: Vec::new(),
            return_type: Some(return_type.into()),
            binding: Binding::Static,
        }
    }

    pub fn with_binding(self, binding: Binding) -> Self {
        MethodInterface { binding, ..self }
    }

    /// Wrap the signature into an implementation for `class_name`.
    pub fn implement(&self, class_name: &str, body: Vec<Statement>) -> MethodImplementation {
        MethodImplementation {
            class_name: class_name.to_string(),
            method: self.clone(),
            locals: Vec::new(),
            body,
        }
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

impl ClassMember {
    pub fn new(visibility: Visibility, kind: MemberKind) -> Self {
        ClassMember {
            visibility,
            comment: Vec::new(),
            kind,
        }
    }

    pub fn with_comment(mut self, comment: Vec<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Name of the declared member, for uniqueness checks.
    pub fn name(&self) -> &str {
        match &self.kind {
            MemberKind::Constant { name, .. }
            | MemberKind::Field { name, .. }
            | MemberKind::Property { name, .. } => name,
            MemberKind::Method(method) => &method.name,
            MemberKind::NestedType(declaration) => declaration.name(),
        }
    }
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        match self {
            TypeDeclaration::ForwardClass { name } => name,
            TypeDeclaration::Class(class) => &class.name,
            TypeDeclaration::Enum(enumeration) => &enumeration.name,
        }
    }
}
