//! Error types for the IR crate.

use crate::value::VarId;
use thiserror::Error;

/// Errors raised by structural validity checks on equation graphs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// An equation reads a variable before any equation defines it.
    #[error("equation {eqn_index} reads variable {var} before it is defined")]
    UndefinedOperand {
        /// Index of the offending equation.
        eqn_index: usize,
        /// The undefined variable.
        var: VarId,
    },

    /// An equation output reuses a variable that already has a producer.
    #[error("equation {eqn_index} redefines variable {var}")]
    RedefinedVariable {
        /// Index of the offending equation.
        eqn_index: usize,
        /// The redefined variable.
        var: VarId,
    },

    /// A variable id does not exist in the graph's namespace.
    #[error("variable {var} does not exist in this graph")]
    UnknownVariable {
        /// The unknown variable.
        var: VarId,
    },

    /// An equation's output count disagrees with its primitive's declared arity.
    #[error("primitive '{prim}' declares {expected} outputs, equation {eqn_index} has {got}")]
    OutputArityMismatch {
        /// Name of the primitive.
        prim: String,
        /// Index of the offending equation.
        eqn_index: usize,
        /// Declared output arity.
        expected: usize,
        /// Actual output count.
        got: usize,
    },

    /// A graph output references a variable no equation or input defines.
    #[error("graph output references undefined variable {var}")]
    UndefinedOutput {
        /// The undefined variable.
        var: VarId,
    },
}

/// Result type for IR operations.
pub type GraphResult<T> = Result<T, GraphError>;
