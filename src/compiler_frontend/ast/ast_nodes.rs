//! Syntactic tree handed to the semantic core by the parser.
//!
//! Nothing here is type checked. Names are plain strings, types are still written the way the
//! source wrote them and literals have not been given a kind yet. Every node is serde
//! serializable so a separate parser process can hand a module over as JSON.

use crate::compiler_frontend::datatypes::PrimitiveKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextLocation {
    #[serde(default)]
    pub scope: PathBuf,
    #[serde(default)]
    pub start_pos: CharPosition,
    #[serde(default)]
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new(scope: PathBuf, start: CharPosition, end: CharPosition) -> Self {
        Self {
            scope,
            start_pos: start,
            end_pos: end,
        }
    }

    pub fn new_just_line(line: i32) -> Self {
        Self {
            scope: PathBuf::new(),
            start_pos: CharPosition {
                line_number: line,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: line,
                char_column: 120, // Arbitrary number
            },
        }
    }
}

/// One compilation unit.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub path: String,

    // Fully qualified declarations supplied by import resolution
    #[serde(default)]
    pub imports: Vec<ImportedFunction>,

    #[serde(default)]
    pub types: Vec<TypeDecl>,

    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenericParam {
    // Stored with the leading apostrophe, e.g. 'a
    Lifetime(String),
    Type(String),
}

impl GenericParam {
    pub fn name(&self) -> &str {
        match self {
            GenericParam::Lifetime(name) | GenericParam::Type(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    #[serde(default)]
    pub params: Vec<Param>,

    // None is the unit type
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    pub body: Expr,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_export: bool,
    #[serde(default)]
    pub location: TextLocation,
}

/// A function the module uses but does not define, e.g. from `use math::u64::{add}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportedFunction {
    // The qualified path the name was imported from, e.g. math::u64
    pub module_path: String,
    pub name: String,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub location: TextLocation,
}

/// A struct or enum declaration. Only the name and generic list are known for now.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Tuple(Vec<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        element: Box<TypeExpr>,
        length: Box<Expr>,
    },
    Reference {
        #[serde(default)]
        lifetime: Option<String>,
        target: Box<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    FunctionPointer {
        #[serde(default)]
        generics: Vec<GenericParam>,
        params: Vec<TypeExpr>,
        result: Box<TypeExpr>,
    },
    Path {
        name: String,
        #[serde(default)]
        args: Vec<TypeArg>,
    },
}

impl TypeExpr {
    pub fn named(name: &str) -> TypeExpr {
        TypeExpr::Path {
            name: name.to_owned(),
            args: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeArg {
    Lifetime(String),
    Type(TypeExpr),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub location: TextLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, location: TextLocation) -> Self {
        Expr { kind, location }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Tuple(Vec<Expr>),
    Array(Vec<Expr>),
    Identifier(String),

    // f(a, b)
    Call {
        name: String,
        args: Vec<Expr>,
    },

    // receiver.method(args)
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    Cast {
        value: Box<Expr>,
        target: TypeExpr,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Reference(Box<Expr>),
    Dereference(Box<Expr>),
    Block {
        expressions: Vec<Expr>,
        #[serde(default)]
        trailing_semicolon: bool,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer {
        value: u64,
        #[serde(default)]
        suffix: Option<PrimitiveKind>,
    },
    Float {
        value: f64,
        #[serde(default)]
        suffix: Option<PrimitiveKind>,
    },
    Bool(bool),
    Byte(u8),
    ByteString(Vec<u8>),
    Char(char),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    BitOr,
    BitAnd,
    BitXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulus
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::BitXor)
    }

    pub fn is_comparison(self) -> bool {
        !self.is_arithmetic() && !self.is_bitwise()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulus => "%",
            BinaryOp::BitOr => "|",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    // Alternatives joined by |
    pub patterns: Vec<Pattern>,
    pub body: Expr,
    #[serde(default)]
    pub location: TextLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Wildcard,
    Literal {
        value: Literal,
        #[serde(default)]
        negated: bool,
    },
}
