//! Deterministic, collision-avoiding identifier generation.
//!
//! Every Delphi identifier the generators emit comes from an
//! [`IdentifierTemplate`]: a core-string extractor for some entity type plus a
//! [`NamingRule`] (case style, fixed prefix/suffix, collision-avoidance
//! suffix, case sensitivity). One algorithm serves every template:
//!
//! 1. style the core, wrap it in prefix and suffix;
//! 2. if the result is reserved, or another rule in the colliding set could
//!    have produced it, retry once with the collision-avoidance suffix
//!    appended to the styled core;
//! 3. if the retry still collides, fail with
//!    [`Error::IdentifierCollision`](crate::error::Error::IdentifierCollision).
//!
//! Generation is a pure function of `(entity, template, colliding, reserved)`.

use heck::{ToShoutySnakeCase, ToUpperCamelCase};

use crate::error::{Error, Result};

/// Case style applied to the core string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    /// `field_name` becomes `FieldName`.
    Pascal,
    /// `fieldName` becomes `FIELD_NAME`.
    ScreamingSnake,
    /// The core is used as-is.
    Verbatim,
}

impl CaseStyle {
    pub fn apply(self, core: &str) -> String {
        match self {
            CaseStyle::Pascal => core.to_upper_camel_case(),
            CaseStyle::ScreamingSnake => core.to_shouty_snake_case(),
            CaseStyle::Verbatim => core.to_string(),
        }
    }
}

/// Naming rule shared by all identifiers of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingRule {
    /// Short name of the identifier kind, used in error messages.
    pub kind: &'static str,
    pub case: CaseStyle,
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub collision_suffix: &'static str,
    pub case_sensitive: bool,
}

impl NamingRule {
    /// A Pascal-cased, case-insensitive rule without prefix or suffix.
    pub const fn new(kind: &'static str) -> Self {
        NamingRule {
            kind,
            case: CaseStyle::Pascal,
            prefix: "",
            suffix: "",
            collision_suffix: "_",
            case_sensitive: false,
        }
    }

    pub const fn case(self, case: CaseStyle) -> Self {
        NamingRule { case, ..self }
    }

    pub const fn prefix(self, prefix: &'static str) -> Self {
        NamingRule { prefix, ..self }
    }

    pub const fn suffix(self, suffix: &'static str) -> Self {
        NamingRule { suffix, ..self }
    }

    fn wrap(&self, styled_core: &str, collision: bool) -> String {
        let collision_suffix = if collision { self.collision_suffix } else { "" };
        format!(
            "{}{styled_core}{collision_suffix}{}",
            self.prefix, self.suffix
        )
    }

    /// Whether this rule could have produced `ident` from some core string.
    ///
    /// True when `ident` carries this rule's prefix and suffix and the part in
    /// between is non-empty and already in this rule's case style. Prefix and
    /// suffix honor `case_sensitive`; the styled core must match exactly, so
    /// `Filled` is not mistaken for the backing field of `illed`.
    pub fn could_produce(&self, ident: &str) -> bool {
        let Some(rest) = strip_prefix(ident, self.prefix, self.case_sensitive) else {
            return false;
        };
        let Some(inner) = strip_suffix(rest, self.suffix, self.case_sensitive) else {
            return false;
        };
        !inner.is_empty() && self.case.apply(inner) == inner
    }
}

fn strip_prefix<'a>(s: &'a str, prefix: &str, case_sensitive: bool) -> Option<&'a str> {
    if case_sensitive {
        return s.strip_prefix(prefix);
    }
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn strip_suffix<'a>(s: &'a str, suffix: &str, case_sensitive: bool) -> Option<&'a str> {
    if case_sensitive {
        return s.strip_suffix(suffix);
    }
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

/// Identifiers that generated names must never equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedIdentifiers {
    idents: Vec<String>,
}

impl ReservedIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, idents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.idents.extend(idents.into_iter().map(Into::into));
        self
    }

    pub fn insert(&mut self, ident: impl Into<String>) {
        self.idents.push(ident.into());
    }

    pub fn contains(&self, ident: &str, case_sensitive: bool) -> bool {
        self.idents.iter().any(|reserved| {
            if case_sensitive {
                reserved == ident
            } else {
                reserved.eq_ignore_ascii_case(ident)
            }
        })
    }
}

/// Naming template for one identifier kind over entities of type `E`.
pub struct IdentifierTemplate<E: ?Sized> {
    core: fn(&E) -> String,
    rule: NamingRule,
}

impl<E: ?Sized> Clone for IdentifierTemplate<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized> Copy for IdentifierTemplate<E> {}

impl<E: ?Sized> IdentifierTemplate<E> {
    pub const fn new(core: fn(&E) -> String, rule: NamingRule) -> Self {
        IdentifierTemplate { core, rule }
    }

    /// Generate the identifier for `entity`.
    ///
    /// `colliding` lists the rules of other identifier kinds sharing the same
    /// scope that this kind must yield to.
    pub fn generate(
        &self,
        entity: &E,
        colliding: &[NamingRule],
        reserved: &ReservedIdentifiers,
    ) -> Result<String> {
        let core = (self.core)(entity);
        let styled = self.rule.case.apply(&core);

        let first = self.rule.wrap(&styled, false);
        if !self.collides(&first, colliding, reserved) {
            return Ok(first);
        }

        let second = self.rule.wrap(&styled, true);
        if !self.collides(&second, colliding, reserved) {
            return Ok(second);
        }

        Err(Error::IdentifierCollision {
            kind: self.rule.kind,
            entity: core,
            identifier: second,
        })
    }

    /// Generate the identifier for `entity` and reserve it in `scope`, so
    /// later identifiers of the same scope yield to it.
    pub fn claim(
        &self,
        entity: &E,
        colliding: &[NamingRule],
        scope: &mut ReservedIdentifiers,
    ) -> Result<String> {
        let ident = self.generate(entity, colliding, scope)?;
        scope.insert(ident.clone());
        Ok(ident)
    }

    fn collides(&self, ident: &str, colliding: &[NamingRule], reserved: &ReservedIdentifiers) -> bool {
        reserved.contains(ident, self.rule.case_sensitive)
            || colliding.iter().any(|rule| rule.could_produce(ident))
    }
}

/// Delphi reserved words. Identifiers equal to one of these (ignoring case)
/// are not valid declarations.
pub const DELPHI_KEYWORDS: &[&str] = &[
    "and", "array", "as", "asm", "begin", "case", "class", "const", "constructor",
    "destructor", "dispinterface", "div", "do", "downto", "else", "end", "except", "exports",
    "file", "finalization", "finally", "for", "function", "goto", "if", "implementation", "in",
    "inherited", "initialization", "inline", "interface", "is", "label", "library", "mod", "nil",
    "not", "object", "of", "operator", "or", "out", "packed", "procedure", "program", "property",
    "raise", "record", "repeat", "resourcestring", "set", "shl", "shr", "string", "then",
    "threadvar", "to", "try", "type", "unit", "until", "uses", "var", "while", "with", "xor",
];
