//! Alsvid Lowering Pass
//!
//! This crate lowers a traced hybrid quantum-classical program — an
//! equation graph over [`alsvid_ir::SourcePrim`] produced by a capture
//! front-end — into the kernel-form graph over [`alsvid_ir::TargetPrim`]
//! consumed by an ahead-of-time backend.
//!
//! # Overview
//!
//! The pass is a single-traversal, stateful rewrite:
//!
//! 1. The composer walks the outer graph in program order, copying
//!    classical equations through with remapped operands.
//! 2. Each traced sub-program call is lowered in isolation ([`Environment`]
//!    per scope, one register thread per kernel) and re-embedded as one
//!    kernel-call equation at its original position.
//! 3. Inside a kernel, nested adjoint/control wrappers are flattened into a
//!    single (parity, control-wires, control-values) triple applied to the
//!    base operator, and each measurement process maps to its dedicated
//!    target primitive.
//!
//! Unsupported traced constructs abort lowering with a typed [`LowerError`];
//! a partial graph is never returned.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{
//!     AbstractValue, DeviceConfig, ElemKind, Graph, Literal, MeasurementKind, QnodeCall,
//!     SourcePrim, TargetPrim,
//! };
//! use alsvid_lower::lower_graph;
//!
//! // Trace of: workflow(x) = qnode(x), where the qnode applies RX(x, 0)
//! // and returns expval(PauliZ(0)).
//! let mut kernel: Graph<SourcePrim> = Graph::new();
//! let x = kernel.input(AbstractValue::scalar(ElemKind::F64));
//! kernel.push(
//!     SourcePrim::Gate { name: "RX".into(), n_params: 1, n_wires: 1 },
//!     vec![x.into(), Literal::I64(0).into()],
//!     vec![AbstractValue::operator()],
//! );
//! let obs = kernel.push(
//!     SourcePrim::NamedObs { name: "PauliZ".into(), n_wires: 1 },
//!     vec![Literal::I64(0).into()],
//!     vec![AbstractValue::observable()],
//! )[0];
//! let ev = kernel.push(
//!     SourcePrim::Measure { kind: MeasurementKind::Expval, eigvals: None },
//!     vec![obs.into()],
//!     vec![AbstractValue::scalar(ElemKind::F64)],
//! )[0];
//! kernel.outputs = vec![ev.into()];
//!
//! let mut workflow: Graph<SourcePrim> = Graph::new();
//! let arg = workflow.input(AbstractValue::scalar(ElemKind::F64));
//! let call = QnodeCall {
//!     graph: kernel,
//!     device: DeviceConfig::new("lightning.qubit", 1),
//!     dynamic_shots: false,
//! };
//! let res = workflow.push(
//!     SourcePrim::Qnode(Box::new(call)),
//!     vec![arg.into()],
//!     vec![AbstractValue::scalar(ElemKind::F64)],
//! )[0];
//! workflow.outputs = vec![res.into()];
//!
//! let lowered = lower_graph(&workflow).unwrap();
//! assert!(matches!(lowered.eqns[0].prim, TargetPrim::Kernel(_)));
//! assert_eq!(lowered.outputs.len(), 1);
//! ```

pub mod compose;
pub mod env;
pub mod error;
mod kernel;
pub mod modifier;

pub use compose::lower_graph;
pub use env::Environment;
pub use error::{LowerError, LowerResult};
pub use modifier::{flatten_modifiers, producer_map, ModifierSpec, ProducerMap};
