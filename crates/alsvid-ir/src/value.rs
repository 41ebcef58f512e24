//! Abstract values, variables, and literals.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element kind of an abstract value.
///
/// `Operator` and `Observable` values only occur in traced (source) graphs;
/// `Qreg` only occurs in lowered (target) graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElemKind {
    /// 64-bit float.
    F64,
    /// 64-bit signed integer.
    I64,
    /// Boolean.
    Bool,
    /// Double-precision complex number.
    Complex128,
    /// An operator value produced by a traced gate or modifier wrapper.
    Operator,
    /// An observable value produced by a traced observable equation.
    Observable,
    /// The quantum register threaded through a lowered kernel.
    Qreg,
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElemKind::F64 => "f64",
            ElemKind::I64 => "i64",
            ElemKind::Bool => "bool",
            ElemKind::Complex128 => "c128",
            ElemKind::Operator => "op",
            ElemKind::Observable => "obs",
            ElemKind::Qreg => "qreg",
        };
        write!(f, "{name}")
    }
}

/// One extent of an abstract value's shape.
///
/// `Dynamic` marks a dimension whose extent is only known at runtime, e.g.
/// the leading dimension of a sample result whose shot count is a runtime
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    /// Extent fixed at lowering time.
    Known(u64),
    /// Extent determined by a runtime value.
    Dynamic,
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Known(n) => write!(f, "{n}"),
            Dim::Dynamic => write!(f, "?"),
        }
    }
}

/// Shape and element-kind descriptor attached to every variable.
///
/// Fixed at variable creation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractValue {
    /// Element kind.
    pub elem: ElemKind,
    /// Shape; empty for scalars.
    pub shape: Vec<Dim>,
}

impl AbstractValue {
    /// A scalar of the given element kind.
    pub fn scalar(elem: ElemKind) -> Self {
        Self { elem, shape: vec![] }
    }

    /// A rank-1 value of the given element kind and length.
    pub fn vector(elem: ElemKind, len: u64) -> Self {
        Self {
            elem,
            shape: vec![Dim::Known(len)],
        }
    }

    /// A rank-2 value of the given element kind.
    pub fn matrix(elem: ElemKind, rows: Dim, cols: Dim) -> Self {
        Self {
            elem,
            shape: vec![rows, cols],
        }
    }

    /// The quantum register value.
    pub fn qreg() -> Self {
        Self::scalar(ElemKind::Qreg)
    }

    /// An operator value.
    pub fn operator() -> Self {
        Self::scalar(ElemKind::Operator)
    }

    /// An observable value.
    pub fn observable() -> Self {
        Self::scalar(ElemKind::Observable)
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Check if this is a scalar.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if this is the quantum register value.
    pub fn is_qreg(&self) -> bool {
        self.elem == ElemKind::Qreg
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.elem)?;
        if !self.shape.is_empty() {
            write!(f, "[")?;
            for (i, d) in self.shape.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{d}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Handle for a bound variable within one graph's namespace.
///
/// Ids index the owning graph's abstract-value table and are never shared
/// across graphs; nested sub-graphs have fully independent namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl VarId {
    /// The id as a table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A compile-time constant carrying its value directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Scalar float.
    F64(f64),
    /// Scalar integer.
    I64(i64),
    /// Scalar boolean.
    Bool(bool),
    /// Float vector.
    F64Vec(Vec<f64>),
    /// Integer vector (e.g. a computational basis state).
    I64Vec(Vec<i64>),
    /// Complex amplitude vector (e.g. a prepared state).
    C128Vec(Vec<Complex64>),
}

impl Literal {
    /// The abstract value describing this literal.
    pub fn aval(&self) -> AbstractValue {
        match self {
            Literal::F64(_) => AbstractValue::scalar(ElemKind::F64),
            Literal::I64(_) => AbstractValue::scalar(ElemKind::I64),
            Literal::Bool(_) => AbstractValue::scalar(ElemKind::Bool),
            Literal::F64Vec(v) => AbstractValue::vector(ElemKind::F64, v.len() as u64),
            Literal::I64Vec(v) => AbstractValue::vector(ElemKind::I64, v.len() as u64),
            Literal::C128Vec(v) => AbstractValue::vector(ElemKind::Complex128, v.len() as u64),
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::I64(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// An equation input: either a bound variable or an inline literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A bound variable, referenced by identity.
    Var(VarId),
    /// A literal constant.
    Lit(Literal),
}

impl Operand {
    /// The bound variable, if this operand is one.
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Operand::Var(v) => Some(*v),
            Operand::Lit(_) => None,
        }
    }

    /// The literal, if this operand is one.
    pub fn as_lit(&self) -> Option<&Literal> {
        match self {
            Operand::Var(_) => None,
            Operand::Lit(l) => Some(l),
        }
    }
}

impl From<VarId> for Operand {
    fn from(v: VarId) -> Self {
        Operand::Var(v)
    }
}

impl From<Literal> for Operand {
    fn from(l: Literal) -> Self {
        Operand::Lit(l)
    }
}
