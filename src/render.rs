//! Minimal text renderer for the Delphi AST.
//!
//! Two-space indentation, one declaration per line. Inside a class, a
//! visibility header is emitted whenever visibility changes, and a
//! `const`/`type`/`var` keyword whenever the member group changes. Every
//! `if` branch and `case` arm is a `begin ... end` block.

use crate::ast::{
    Binding, ClassDeclaration, ClassMember, EnumDeclaration, MemberKind, MethodImplementation,
    MethodInterface, MethodKind, Parameter, Statement, TypeDeclaration, Unit, Visibility,
};

/// Render a complete unit.
pub fn render_unit(unit: &Unit) -> String {
    let mut out = Printer::default();

    for line in &unit.header {
        out.comment("//", line);
    }
    if !unit.header.is_empty() {
        out.blank();
    }

    out.line(format!("unit {};", unit.name));
    out.blank();
    out.line("{$SCOPEDENUMS ON}");
    out.blank();
    out.line("interface");
    out.blank();

    if !unit.uses.is_empty() {
        out.line("uses");
        out.indented(|out| {
            let last = unit.uses.len() - 1;
            for (i, used) in unit.uses.iter().enumerate() {
                let separator = if i == last { ";" } else { "," };
                out.line(format!("{used}{separator}"));
            }
        });
        out.blank();
    }

    if !unit.types.is_empty() {
        out.line("type");
        out.indented(|out| out.type_section(&unit.types));
        out.blank();
    }

    out.line("implementation");
    out.blank();
    for method in &unit.implementation {
        out.method_implementation(method);
        out.blank();
    }
    out.line("end.");

    out.finish()
}

#[derive(Default)]
struct Printer {
    text: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.text.push_str("  ");
            }
            self.text.push_str(text);
        }
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn comment(&mut self, marker: &str, text: &str) {
        if text.is_empty() {
            self.line(marker);
        } else {
            self.line(format!("{marker} {text}"));
        }
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn finish(self) -> String {
        self.text
    }

    // ── Declarations ───────────────────────────────────────────────────

    /// Declarations separated by blank lines; forward declarations stay
    /// together.
    fn type_section(&mut self, types: &[TypeDeclaration]) {
        let mut previous_forward = None;
        for declaration in types {
            let forward = matches!(declaration, TypeDeclaration::ForwardClass { .. });
            if previous_forward.is_some_and(|previous| !(previous && forward)) {
                self.blank();
            }
            self.type_declaration(declaration);
            previous_forward = Some(forward);
        }
    }

    fn type_declaration(&mut self, declaration: &TypeDeclaration) {
        match declaration {
            TypeDeclaration::ForwardClass { name } => self.line(format!("{name} = class;")),
            TypeDeclaration::Enum(enumeration) => self.enum_declaration(enumeration),
            TypeDeclaration::Class(class) => self.class_declaration(class),
        }
    }

    fn doc_comment(&mut self, comment: &[String]) {
        for line in comment {
            self.comment("///", line);
        }
    }

    fn enum_declaration(&mut self, enumeration: &EnumDeclaration) {
        self.doc_comment(&enumeration.comment);
        self.line(format!("{} = (", enumeration.name));
        self.indented(|out| {
            let last = enumeration.values.len().saturating_sub(1);
            for (i, value) in enumeration.values.iter().enumerate() {
                let separator = if i == last { "" } else { "," };
                out.line(format!("{} = {}{separator}", value.name, value.ordinal));
            }
        });
        self.line(");");
    }

    fn class_declaration(&mut self, class: &ClassDeclaration) {
        self.doc_comment(&class.comment);
        self.line(format!("{} = class({})", class.name, class.ancestor));

        let mut section: Option<(Visibility, Group)> = None;
        for member in &class.members {
            let group = Group::of(member);
            let visibility_changed =
                section.is_none_or(|(visibility, _)| visibility != member.visibility);
            if visibility_changed {
                self.line(visibility_keyword(member.visibility));
            }
            if visibility_changed || section.is_none_or(|(_, current)| current != group) {
                self.indented(|out| {
                    if let Some(keyword) = group.keyword() {
                        out.line(keyword);
                    }
                });
            }
            section = Some((member.visibility, group));

            let depth = if group.keyword().is_some() { 2 } else { 1 };
            self.depth += depth;
            self.class_member(member);
            self.depth -= depth;
        }

        self.line("end;");
    }

    fn class_member(&mut self, member: &ClassMember) {
        self.doc_comment(&member.comment);
        match &member.kind {
            MemberKind::Constant { name, value } => self.line(format!("{name} = {value};")),
            MemberKind::Field { name, type_name } => self.line(format!("{name}: {type_name};")),
            MemberKind::Property {
                name,
                type_name,
                getter,
                setter,
            } => self.line(format!(
                "property {name}: {type_name} read {getter} write {setter};"
            )),
            MemberKind::Method(method) => {
                let directive = match method.binding {
                    Binding::Static => "",
                    Binding::Virtual => " virtual;",
                    Binding::Override => " override;",
                };
                self.line(format!("{};{directive}", signature(method, None)));
            }
            MemberKind::NestedType(declaration) => self.type_declaration(declaration),
        }
    }

    // ── Implementation ─────────────────────────────────────────────────

    fn method_implementation(&mut self, method: &MethodImplementation) {
        self.line(format!(
            "{};",
            signature(&method.method, Some(&method.class_name))
        ));
        if !method.locals.is_empty() {
            self.line("var");
            self.indented(|out| {
                for local in &method.locals {
                    out.line(format!("{}: {};", local.name, local.type_name));
                }
            });
        }
        self.block(&method.body, ";");
    }

    fn block(&mut self, body: &[Statement], terminator: &str) {
        self.line("begin");
        self.indented(|out| {
            for statement in body {
                out.statement(statement);
            }
        });
        self.line(format!("end{terminator}"));
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Simple { code } => self.line(format!("{code};")),
            Statement::If { .. } => self.if_chain(statement),
            Statement::Case { selector, arms } => {
                if arms.is_empty() {
                    return;
                }
                self.line(format!("case {selector} of"));
                self.indented(|out| {
                    for arm in arms {
                        out.line(format!("{}:", arm.label));
                        out.block(&arm.body, ";");
                    }
                });
                self.line("end;");
            }
        }
    }

    /// `if`, with an `else` holding a single `if` folded into `else if`.
    fn if_chain(&mut self, statement: &Statement) {
        let mut keyword = "if";
        let mut current = statement;
        while let Statement::If {
            condition,
            then_branch,
            else_branch,
        } = current
        {
            self.line(format!("{keyword} {condition} then"));
            if else_branch.is_empty() {
                self.block(then_branch, ";");
                return;
            }
            self.block(then_branch, "");
            match else_branch.as_slice() {
                [nested @ Statement::If { .. }] => {
                    keyword = "else if";
                    current = nested;
                }
                _ => {
                    self.line("else");
                    self.block(else_branch, ";");
                    return;
                }
            }
        }
    }
}

/// Member groups that need their own section keyword inside a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Const,
    Type,
    Var,
    Routine,
}

impl Group {
    fn of(member: &ClassMember) -> Self {
        match member.kind {
            MemberKind::Constant { .. } => Group::Const,
            MemberKind::NestedType(_) => Group::Type,
            MemberKind::Field { .. } => Group::Var,
            MemberKind::Property { .. } | MemberKind::Method(_) => Group::Routine,
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            Group::Const => Some("const"),
            Group::Type => Some("type"),
            Group::Var => Some("var"),
            Group::Routine => None,
        }
    }
}

fn visibility_keyword(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Private => "private",
        Visibility::Protected => "protected",
        Visibility::Public => "public",
    }
}

/// Method heading without the trailing semicolon. `class_name` qualifies
/// the name in the implementation section.
fn signature(method: &MethodInterface, class_name: Option<&str>) -> String {
    let keyword = match method.kind {
        MethodKind::Procedure => "procedure",
        MethodKind::Function => "function",
        MethodKind::Constructor => "constructor",
        MethodKind::Destructor => "destructor",
    };
    let name = match class_name {
        Some(class_name) => format!("{class_name}.{}", method.name),
        None => method.name.clone(),
    };
    let mut heading = format!("{keyword} {name}{}", parameters(&method.parameters));
    if let Some(return_type) = &method.return_type {
        heading.push_str(": ");
        heading.push_str(return_type);
    }
    heading
}

fn parameters(parameters: &[Parameter]) -> String {
    if parameters.is_empty() {
        return String::new();
    }
    let list: Vec<String> = parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.type_name))
        .collect();
    format!("({})", list.join("; "))
}
