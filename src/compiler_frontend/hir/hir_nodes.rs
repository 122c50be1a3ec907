//! ============================================================
//!                         HIR Nodes
//! ============================================================
//! The typed, resolved form of a possum function body.
//!  - Every expression carries its type
//!  - Every call is a canonical prefix call to a resolved function id
//!  - Every argument carries the cast the call site needs
//!  - Literal operator trees are folded away before codegen
//!
//! Nodes are built once by the HIR builder and never mutated afterwards.
//! The only pass that rewrites them is constant folding, which consumes a tree
//! and produces a new one.

use crate::compiler_frontend::analysis::match_compiler::DecisionTree;
use crate::compiler_frontend::ast::ast_nodes::{BinaryOp, TextLocation, UnaryOp};
use crate::compiler_frontend::casts::CastKind;
use crate::compiler_frontend::datatypes::Type;
use crate::compiler_frontend::symbol_table::FunctionId;
use std::fmt;

// ============================================================
// Stable IDs
// ============================================================

/// Index of a parameter in its function's parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

/// A function together with the type arguments of the instantiation being called.
/// Non-generic functions always have an empty argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub id: FunctionId,
    pub type_args: Vec<Type>,
}

impl FunctionRef {
    pub fn plain(id: FunctionId) -> Self {
        FunctionRef {
            id,
            type_args: Vec::new(),
        }
    }
}

// ============================================================
// Module
// ============================================================
#[derive(Debug, Clone)]
pub struct HirModule {
    // Non-generic functions in declaration order, then instantiations in discovery order
    pub functions: Vec<HirFunction>,
}

#[derive(Debug, Clone)]
pub struct HirFunction {
    // Source name, or the mangled name of an instantiation like `identity<u64>`
    pub name: String,
    pub symbol: FunctionRef,
    pub params: Vec<HirParam>,
    pub return_type: Type,
    pub body: Expression,
    pub is_const: bool,
    pub is_export: bool,
    pub location: TextLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirParam {
    pub name: String,
    pub data_type: Type,
}

// ============================================================
// Expressions
// ============================================================
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub data_type: Type,
    pub location: TextLocation,
}

impl Expression {
    pub fn new(kind: ExpressionKind, data_type: Type, location: TextLocation) -> Self {
        Expression {
            kind,
            data_type,
            location,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Int(_) | ExpressionKind::Float(_) | ExpressionKind::Bool(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    // Integers are kept wrapped to their kind's width.
    // Signed kinds are sign extended, unsigned kinds are zero extended.
    Int(i128),

    // f32 values are rounded through f32 before being stored here
    Float(f64),
    Bool(bool),

    Tuple(Vec<Expression>),
    Array(Vec<Expression>),

    Local(LocalId),
    Call(CanonicalCall),

    Cast {
        value: Box<Expression>,
        origin: CastOrigin,
    },

    // Literal only. These never survive constant folding.
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    Reference(Box<Expression>),
    Dereference(Box<Expression>),

    Block {
        expressions: Vec<Expression>,

        // False when the block is empty or the last expression was sequenced away with `;`
        has_value: bool,
    },

    Match(Box<HirMatch>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOrigin {
    // Written with `as`
    Explicit,

    // Inserted at a return position or a match arm
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirMatch {
    pub scrutinee: Expression,
    pub decision: DecisionTree,

    // Arm bodies, indexed by the decision tree's arm numbers
    pub arms: Vec<Expression>,
}

/// A resolved call in prefix form: `f(a, b)`, whatever sugar the source used.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalCall {
    pub target: FunctionRef,
    pub args: Vec<CallArgument>,
    pub return_type: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallArgument {
    pub value: Expression,

    // Identity or Implicit. Converts value.data_type into param_type.
    pub cast: CastKind,
    pub param_type: Type,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Int(value) => write!(f, "{value}{}", self.data_type),
            ExpressionKind::Float(value) => write!(f, "{value}{}", self.data_type),
            ExpressionKind::Bool(value) => write!(f, "{value}"),
            ExpressionKind::Tuple(elements) => {
                write!(f, "(")?;
                write_expressions(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            ExpressionKind::Array(elements) => {
                write!(f, "[")?;
                write_expressions(f, elements)?;
                write!(f, "]")
            }
            ExpressionKind::Local(id) => write!(f, "local{}", id.0),
            ExpressionKind::Call(call) => {
                write!(f, "fn{}(", call.target.id.0)?;
                for (index, arg) in call.args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.value)?;
                    if arg.cast != CastKind::Identity {
                        write!(f, " as {}", arg.param_type)?;
                    }
                }
                write!(f, ")")
            }
            ExpressionKind::Cast { value, .. } => write!(f, "({value} as {})", self.data_type),
            ExpressionKind::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::BitNot => write!(f, "~{operand}"),
            },
            ExpressionKind::Binary { op, lhs, rhs } => {
                write!(f, "({lhs} {} {rhs})", op.symbol())
            }
            ExpressionKind::Reference(value) => write!(f, "&{value}"),
            ExpressionKind::Dereference(value) => write!(f, "*{value}"),
            ExpressionKind::Block {
                expressions,
                has_value,
            } => {
                write!(f, "{{ ")?;
                for expression in expressions {
                    write!(f, "{expression}; ")?;
                }
                if *has_value {
                    write!(f, "<value> ")?;
                }
                write!(f, "}}")
            }
            ExpressionKind::Match(hir_match) => {
                write!(f, "match {} {{ {} arms }}", hir_match.scrutinee, hir_match.arms.len())
            }
        }
    }
}

fn write_expressions(f: &mut fmt::Formatter<'_>, expressions: &[Expression]) -> fmt::Result {
    for (index, expression) in expressions.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{expression}")?;
    }
    Ok(())
}
