//! The lowered (target) primitive vocabulary.
//!
//! This is the vocabulary the ahead-of-time backend consumes: flattened
//! instructions over an explicit quantum register value, dedicated
//! initialization and measurement primitives, and kernel-call equations
//! embedding one lowered sub-program each.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::graph::{Graph, Primitive};
use crate::source::{ClassicalPrim, DeviceConfig};

/// Shot count attached to a sample instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotCount {
    /// Baked at lowering time.
    Static(u64),
    /// Supplied as the equation's trailing operand at runtime.
    Dynamic,
}

/// One lowered quantum sub-program embedded in the classical graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelCall {
    /// The lowered sub-graph, with its own variable namespace.
    pub graph: Graph<TargetPrim>,
    /// Device attributes carried over from the traced call.
    pub device: DeviceConfig,
}

/// The lowered primitive vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetPrim {
    /// A kernel call. Inputs are the classical arguments (preceded by the
    /// runtime shot count when the traced call overrode the device default);
    /// outputs mirror the kernel graph's outputs.
    Kernel(Box<KernelCall>),
    /// Allocate the kernel's register. No inputs, one register output.
    QregAlloc {
        /// Number of wires in the register.
        num_wires: u32,
    },
    /// Release the kernel's register. Input `[qreg]`, no outputs.
    QregFree,
    /// A flattened instruction. Inputs
    /// `[qreg, wires.., params.., ctrl_wires.., ctrl_values..]`, one
    /// register output.
    Inst {
        /// Operator name.
        name: String,
        /// Number of target wire operands.
        qubits_len: usize,
        /// Number of classical parameter operands.
        params_len: usize,
        /// Number of control wire operands (and paired value operands).
        ctrl_len: usize,
        /// Whether the operator is adjointed.
        adjoint: bool,
    },
    /// Basis-state initialization. Inputs `[qreg, bits, wires..]`, one
    /// register output.
    SetBasisState {
        /// Number of wire operands.
        n_wires: usize,
    },
    /// State-vector initialization. Inputs `[qreg, amplitudes, wires..]`,
    /// one register output.
    SetState {
        /// Number of wire operands.
        n_wires: usize,
    },
    /// Construct a named observable. Inputs `[qreg, wires..]`, one
    /// observable output.
    NamedObs {
        /// Observable name.
        name: String,
        /// Declared wire count.
        n_wires: usize,
    },
    /// Expectation value. Input `[obs]`, one scalar output.
    Expval,
    /// Variance. Input `[obs]`, one scalar output.
    Variance,
    /// Basis-state probabilities. Inputs `[qreg, wires..]`, one vector
    /// output of length `2^n_wires`.
    Probs {
        /// Number of wire operands.
        n_wires: usize,
    },
    /// The full state vector over the device register. Input `[qreg]`, one
    /// complex vector output of length `2^num_wires`.
    State {
        /// Number of device wires.
        num_wires: u32,
    },
    /// Per-shot samples. Inputs `[qreg, wires..]`, plus a trailing shot
    /// operand when `shots` is dynamic; one `(shots, n_wires)` output.
    Sample {
        /// Number of wire operands.
        n_wires: usize,
        /// Static or runtime-supplied shot count.
        shots: ShotCount,
    },
    /// Classical arithmetic, copied through from the source graph.
    Classical(ClassicalPrim),
}

impl TargetPrim {
    /// Check if this primitive threads the register (consumes and produces it).
    pub fn threads_register(&self) -> bool {
        matches!(
            self,
            TargetPrim::Inst { .. }
                | TargetPrim::SetBasisState { .. }
                | TargetPrim::SetState { .. }
        )
    }
}

impl Primitive for TargetPrim {
    fn name(&self) -> Cow<'_, str> {
        match self {
            TargetPrim::Kernel(_) => "kernel".into(),
            TargetPrim::QregAlloc { .. } => "qreg_alloc".into(),
            TargetPrim::QregFree => "qreg_free".into(),
            TargetPrim::Inst { name, .. } => name.as_str().into(),
            TargetPrim::SetBasisState { .. } => "set_basis_state".into(),
            TargetPrim::SetState { .. } => "set_state".into(),
            TargetPrim::NamedObs { name, .. } => name.as_str().into(),
            TargetPrim::Expval => "expval".into(),
            TargetPrim::Variance => "variance".into(),
            TargetPrim::Probs { .. } => "probs".into(),
            TargetPrim::State { .. } => "state".into(),
            TargetPrim::Sample { .. } => "sample".into(),
            TargetPrim::Classical(p) => p.name().into(),
        }
    }

    fn output_arity(&self) -> Option<usize> {
        match self {
            TargetPrim::Kernel(_) => None,
            TargetPrim::QregFree => Some(0),
            _ => Some(1),
        }
    }
}
