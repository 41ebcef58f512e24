//! Error types for the lowering pass.
//!
//! Every unsupported traced construct maps to a distinct variant carrying
//! enough context to be surfaced verbatim to the caller. All errors abort
//! lowering at the first occurrence; partial graphs are never returned.

use alsvid_ir::GraphError;
use thiserror::Error;

/// Errors raised while lowering a traced graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LowerError {
    /// An observable measurement targets composite operator arithmetic,
    /// which has no single resolvable wire set.
    #[error(
        "cannot lower a {measurement} over composite operator arithmetic \
         ({kind} of observables); only atomic named observables are supported"
    )]
    UnsupportedOperatorAlgebra {
        /// The measurement kind, e.g. `"expval"`.
        measurement: String,
        /// The arithmetic kind, e.g. `"sum"`.
        kind: String,
    },

    /// A measurement was specified via raw eigenvalues and wires rather
    /// than a named observable.
    #[error(
        "cannot lower a {kind} measurement specified via raw eigenvalues \
         over {n_wires} wire(s); only named observables are supported"
    )]
    UnsupportedMeasurementSpecification {
        /// The measurement kind.
        kind: String,
        /// Number of wires the specification covers.
        n_wires: usize,
    },

    /// A measurement targets a derived classical value rather than wires
    /// or an observable.
    #[error(
        "cannot lower a {kind} measurement over a classical value; \
         only wires and named observables can be measured"
    )]
    UnsupportedMeasurementTarget {
        /// The measurement kind.
        kind: String,
    },

    /// A state measurement restricted to a wire subset. The lowered state
    /// process always spans the full device register.
    #[error(
        "cannot lower a state measurement restricted to {n_wires} wire(s); \
         the state process spans the full device register"
    )]
    UnsupportedWireRestrictedState {
        /// Number of wire operands the traced measurement carries.
        n_wires: usize,
    },

    /// A measurement kind with no defined lowering.
    #[error("measurement kind '{kind}' has no lowering")]
    UnsupportedMeasurementKind {
        /// The measurement kind.
        kind: String,
    },

    /// A modifier wrapper surrounds a base construct that cannot carry it.
    #[error("modifier '{modifier}' cannot be applied to '{base}'")]
    MalformedModifierNesting {
        /// The offending modifier, `"adjoint"` or `"ctrl"`.
        modifier: String,
        /// Name of the wrapped base construct.
        base: String,
    },

    /// A sample measurement with neither a device shot default nor a
    /// runtime override has no derivable output shape.
    #[error(
        "sample measurement needs a shot count: device '{device}' declares \
         none and the call supplies no runtime override"
    )]
    MissingShotCount {
        /// Name of the device the sub-program is bound to.
        device: String,
    },

    /// The input graph violates the IR's structural invariants.
    #[error("malformed source graph: {0}")]
    MalformedSource(#[from] GraphError),

    /// A bug in the pass itself, not a user-facing unsupported-feature
    /// case. Fatal; never catch or retry.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),
}

/// Result type for lowering operations.
pub type LowerResult<T> = Result<T, LowerError>;
