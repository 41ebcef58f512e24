//! The traced (source) primitive vocabulary.
//!
//! This is the vocabulary a tracing front-end emits: high-level operator
//! equations, adjoint/control modifier wrappers, observable construction,
//! measurement processes, and sub-program call equations. The lowering pass
//! consumes graphs over this vocabulary; it never constructs them.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::graph::{Graph, Primitive};

/// Classical arithmetic shared by both vocabularies.
///
/// Classical equations are copied through lowering verbatim, with operands
/// remapped; the pass does not interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassicalPrim {
    /// Elementwise addition.
    Add,
    /// Elementwise subtraction.
    Sub,
    /// Elementwise multiplication.
    Mul,
    /// Elementwise division.
    Div,
    /// Negation.
    Neg,
}

impl ClassicalPrim {
    /// Name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            ClassicalPrim::Add => "add",
            ClassicalPrim::Sub => "sub",
            ClassicalPrim::Mul => "mul",
            ClassicalPrim::Div => "div",
            ClassicalPrim::Neg => "neg",
        }
    }

    /// Number of input operands.
    pub fn arity(self) -> usize {
        match self {
            ClassicalPrim::Neg => 1,
            _ => 2,
        }
    }
}

/// The kind of a traced measurement process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementKind {
    /// Expectation value of an observable.
    Expval,
    /// Variance of an observable.
    Variance,
    /// Probability vector over computational basis states.
    Probs,
    /// The full state vector.
    State,
    /// Per-shot computational basis samples.
    Sample,
    /// Shot histogram keyed by basis state. No lowering exists.
    Counts,
    /// Von Neumann entropy. No lowering exists.
    VnEntropy,
}

impl MeasurementKind {
    /// Name of the measurement process.
    pub fn name(self) -> &'static str {
        match self {
            MeasurementKind::Expval => "expval",
            MeasurementKind::Variance => "var",
            MeasurementKind::Probs => "probs",
            MeasurementKind::State => "state",
            MeasurementKind::Sample => "sample",
            MeasurementKind::Counts => "counts",
            MeasurementKind::VnEntropy => "vn_entropy",
        }
    }

    /// Whether this kind measures an observable operand (as opposed to wires).
    pub fn takes_observable(self) -> bool {
        matches!(self, MeasurementKind::Expval | MeasurementKind::Variance)
    }
}

/// Composite observable arithmetic. Measuring such a value is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObsArithKind {
    /// A sum of observables.
    Sum,
    /// A product of observables.
    Prod,
}

impl ObsArithKind {
    /// Name of the arithmetic kind.
    pub fn name(self) -> &'static str {
        match self {
            ObsArithKind::Sum => "sum",
            ObsArithKind::Prod => "prod",
        }
    }
}

/// Device attributes attached to a sub-program call.
///
/// Supplied by the front-end alongside the traced sub-graph; the lowering
/// pass never re-derives them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name, carried through for diagnostics.
    pub name: String,
    /// Number of addressable wires.
    pub num_wires: u32,
    /// Default shot count, if the device is shot-based.
    pub shots: Option<u64>,
}

impl DeviceConfig {
    /// An analytic (shot-less) device.
    pub fn new(name: impl Into<String>, num_wires: u32) -> Self {
        Self {
            name: name.into(),
            num_wires,
            shots: None,
        }
    }

    /// A shot-based device with the given default shot count.
    pub fn with_shots(name: impl Into<String>, num_wires: u32, shots: u64) -> Self {
        Self {
            name: name.into(),
            num_wires,
            shots: Some(shots),
        }
    }
}

/// A traced quantum sub-program call: one tracing unit bound to one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnodeCall {
    /// The traced sub-graph, with its own variable namespace.
    pub graph: Graph<SourcePrim>,
    /// Device attributes for this sub-program.
    pub device: DeviceConfig,
    /// When set, the call equation's first input operand is a runtime shot
    /// count overriding the device default.
    pub dynamic_shots: bool,
}

/// The traced primitive vocabulary.
///
/// Closed set: every traced construct the lowering supports has a variant
/// here, and dispatch over it is exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourcePrim {
    /// A gate application. Inputs `[params.., wires..]`, one operator output.
    /// A global phase is a gate with zero wires.
    Gate {
        /// Operator name, e.g. `"RX"`.
        name: String,
        /// Number of leading classical parameter operands.
        n_params: usize,
        /// Number of trailing wire operands.
        n_wires: usize,
    },
    /// Adjoint modifier wrapper. Input `[op]`, one operator output.
    Adjoint,
    /// Control modifier wrapper. Inputs `[op, ctrl_wires..]`, one operator
    /// output. One boolean per control wire, paired positionally.
    Ctrl {
        /// Required classical value of each control wire.
        control_values: Vec<bool>,
    },
    /// Computational basis-state preparation. Inputs `[bits, wires..]`.
    BasisState {
        /// Number of wire operands.
        n_wires: usize,
    },
    /// Arbitrary state preparation. Inputs `[amplitudes, wires..]`.
    StatePrep {
        /// Number of wire operands.
        n_wires: usize,
    },
    /// A named atomic observable. Inputs `[wires..]`, one observable output.
    NamedObs {
        /// Observable name, e.g. `"PauliZ"`.
        name: String,
        /// Declared wire count.
        n_wires: usize,
    },
    /// Composite observable arithmetic. Inputs `[obs..]`, one observable
    /// output. Measuring the result has no lowering.
    ObsArith {
        /// Sum or product.
        kind: ObsArithKind,
    },
    /// A measurement process. Observable-valued kinds take `[obs]`; the
    /// others take `[wires..]` (empty means all device wires).
    Measure {
        /// The measurement kind.
        kind: MeasurementKind,
        /// Raw eigenvalue specification, if the front-end recorded one.
        /// No lowering exists for eigenvalue-specified measurements.
        eigvals: Option<Vec<f64>>,
    },
    /// A quantum sub-program call embedded in the classical graph.
    Qnode(Box<QnodeCall>),
    /// Classical arithmetic, copied through lowering verbatim.
    Classical(ClassicalPrim),
}

impl SourcePrim {
    /// Check if this primitive is an adjoint/control modifier wrapper.
    pub fn is_modifier(&self) -> bool {
        matches!(self, SourcePrim::Adjoint | SourcePrim::Ctrl { .. })
    }

    /// Check if this primitive produces an operator value.
    pub fn is_operator_valued(&self) -> bool {
        matches!(
            self,
            SourcePrim::Gate { .. }
                | SourcePrim::Adjoint
                | SourcePrim::Ctrl { .. }
                | SourcePrim::BasisState { .. }
                | SourcePrim::StatePrep { .. }
        )
    }
}

impl Primitive for SourcePrim {
    fn name(&self) -> Cow<'_, str> {
        match self {
            SourcePrim::Gate { name, .. } => name.as_str().into(),
            SourcePrim::Adjoint => "adjoint".into(),
            SourcePrim::Ctrl { .. } => "ctrl".into(),
            SourcePrim::BasisState { .. } => "basis_state".into(),
            SourcePrim::StatePrep { .. } => "state_prep".into(),
            SourcePrim::NamedObs { name, .. } => name.as_str().into(),
            SourcePrim::ObsArith { kind } => kind.name().into(),
            SourcePrim::Measure { kind, .. } => kind.name().into(),
            SourcePrim::Qnode(_) => "qnode".into(),
            SourcePrim::Classical(p) => p.name().into(),
        }
    }

    fn output_arity(&self) -> Option<usize> {
        match self {
            // Call outputs mirror the sub-graph's outputs.
            SourcePrim::Qnode(_) => None,
            _ => Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names() {
        let gate = SourcePrim::Gate {
            name: "RX".into(),
            n_params: 1,
            n_wires: 1,
        };
        assert_eq!(gate.name(), "RX");
        assert_eq!(SourcePrim::Adjoint.name(), "adjoint");
        assert_eq!(
            SourcePrim::Measure {
                kind: MeasurementKind::Expval,
                eigvals: None,
            }
            .name(),
            "expval"
        );
        assert_eq!(
            SourcePrim::ObsArith {
                kind: ObsArithKind::Sum
            }
            .name(),
            "sum"
        );
    }

    #[test]
    fn test_modifier_classification() {
        assert!(SourcePrim::Adjoint.is_modifier());
        assert!(SourcePrim::Ctrl {
            control_values: vec![true]
        }
        .is_modifier());
        assert!(!SourcePrim::Classical(ClassicalPrim::Add).is_modifier());

        assert!(SourcePrim::StatePrep { n_wires: 1 }.is_operator_valued());
        assert!(!SourcePrim::NamedObs {
            name: "PauliZ".into(),
            n_wires: 1
        }
        .is_operator_valued());
    }

    #[test]
    fn test_classical_arity() {
        assert_eq!(ClassicalPrim::Add.arity(), 2);
        assert_eq!(ClassicalPrim::Neg.arity(), 1);
    }

    #[test]
    fn test_measurement_kinds() {
        assert!(MeasurementKind::Expval.takes_observable());
        assert!(MeasurementKind::Variance.takes_observable());
        assert!(!MeasurementKind::Sample.takes_observable());
        assert_eq!(MeasurementKind::Counts.name(), "counts");
    }
}
