use crate::compiler::program::type_context::TypeContext;
use serde::{Deserialize, Serialize};
use std::fmt;

// The typed program model handed over by the front end.
//
// This is a read-only view: the front end has already resolved names and
// checked types, so every expression carries its resolved type and action
// references use fully qualified dotted paths. The backend only walks it.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new_just_line(start: i32) -> Self {
        Self {
            start_pos: CharPosition {
                line_number: start,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: start,
                char_column: 120, // Arbitrary number
            },
        }
    }
}

/// Everything the backend needs in one deserializable unit:
/// the typed program plus the type declarations it refers to
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgramBundle {
    pub program: Program,
    pub types: TypeContext,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Program {
    // Name of the main package instance. The architecture requires one;
    // its absence is a fatal configuration error checked before the pass runs.
    pub main_package: Option<String>,

    pub declarations: Vec<Declaration>,
}

// Closed set of top-level declaration kinds. The builder is an exhaustive
// match over this enum, so adding a variant forces every traversal site
// to be revisited.
#[derive(Debug, Serialize, Deserialize)]
pub enum Declaration {
    Parser(ParserDecl),
    Control(ControlDecl),
    Action(ActionDecl),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParserDecl {
    pub name: String,
    pub states: Vec<ParserState>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParserState {
    pub name: String,
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub transition: Option<StateTransition>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum StateTransition {
    // Unconditional jump to the named state, no branch to record
    Direct(String),
    Select(SelectExpression),
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Statement {
    MethodCall(MethodCall),
    Assign {
        target: Expression,
        value: Expression,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MethodCall {
    // Fully printed method path, e.g. "packet.extract"
    pub method: String,
    #[serde(default)]
    pub type_args: Vec<String>,
    #[serde(default)]
    pub args: Vec<Expression>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectExpression {
    // The tuple of examined fields. After midend simplification these are
    // member expressions into the just-extracted header.
    pub components: Vec<Expression>,
    pub cases: Vec<SelectCase>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectCase {
    pub keyset: Keyset,
    pub next_state: String,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Keyset {
    Literal(u128),
    Range { lo: u128, hi: u128 },
    Mask { value: u128, mask: u128 },
    Default,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlDecl {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionDecl>,
    #[serde(default)]
    pub tables: Vec<TableDecl>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionDecl {
    // Fully qualified dotted name as the front end resolves it,
    // e.g. ".ingress.set_next_hop"
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableDecl {
    pub name: String,
    #[serde(default)]
    pub key: Vec<KeyElement>,
    pub actions: Vec<ActionRef>,
    #[serde(default)]
    pub default_action: Option<DefaultActionProperty>,
    #[serde(default)]
    pub size: Option<SizeProperty>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyElement {
    pub expr: Expression,
    // Resolved match kind name ("exact", "lpm", "ternary", ...)
    pub match_kind: String,
    #[serde(default)]
    pub location: TextLocation,
}

/// A table's reference to an action, with the annotations attached
/// at the reference site (not on the action declaration itself)
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionRef {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultActionProperty {
    // Qualified name of the called action
    pub name: String,
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SizeProperty {
    pub value: u128,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub location: TextLocation,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Annotation {
            name: name.into(),
            location: TextLocation::default(),
        }
    }
}

// -----------------------------
//         EXPRESSIONS
// -----------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    // Resolved by the front end's type checker
    pub ty: TypeRef,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExpressionKind {
    // A plain reference to a declared name
    Path(String),
    Member {
        base: Box<Expression>,
        member: String,
    },
    Literal(u128),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Bits { width: u32, signed: bool },
    Bool,
    // A declared header or struct type, resolved through the TypeContext
    Named(String),
}

impl TypeRef {
    pub fn bit(width: u32) -> Self {
        TypeRef::Bits {
            width,
            signed: false,
        }
    }
}

impl Expression {
    pub fn path(name: impl Into<String>, ty: TypeRef) -> Self {
        Expression {
            kind: ExpressionKind::Path(name.into()),
            ty,
            location: TextLocation::default(),
        }
    }

    pub fn member(base: Expression, member: impl Into<String>, ty: TypeRef) -> Self {
        Expression {
            kind: ExpressionKind::Member {
                base: Box::new(base),
                member: member.into(),
            },
            ty,
            location: TextLocation::default(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Path(name) => write!(f, "{}", name),
            ExpressionKind::Member { base, member } => write!(f, "{}.{}", base, member),
            ExpressionKind::Literal(value) => write!(f, "{}", value),
        }
    }
}
