//! Alsvid Equation-Graph Intermediate Representation
//!
//! This crate provides the core data structures for representing hybrid
//! quantum-classical programs as equation graphs. It is the foundation of
//! the Alsvid lowering stack.
//!
//! # Overview
//!
//! Two primitive vocabularies populate one shared graph shape:
//!
//! - [`SourcePrim`]: the traced vocabulary a capture front-end emits —
//!   high-level operator equations, adjoint/control modifier wrappers,
//!   observable construction, and measurement processes.
//! - [`TargetPrim`]: the lowered vocabulary an ahead-of-time backend
//!   consumes — flattened instructions threading an explicit quantum
//!   register value through each kernel.
//!
//! The shared shape is [`Graph`]: a single-pass-valid ordered sequence of
//! [`Equation`]s over typed variables, where every operand is a graph input,
//! a literal, or the output of an earlier equation. Sub-program calls carry
//! their sub-graph as owned payload, so each graph's variable namespace is
//! fully independent.
//!
//! # Core Components
//!
//! - **Values**: [`AbstractValue`], [`ElemKind`], [`Dim`] describing every
//!   variable's element kind and shape
//! - **Variables**: [`VarId`] handles, [`Literal`] constants, [`Operand`]
//!   inputs
//! - **Graphs**: [`Equation`], [`Graph`], the [`Primitive`] vocabulary trait
//! - **Vocabularies**: [`SourcePrim`] and [`TargetPrim`], plus the shared
//!   [`ClassicalPrim`] arithmetic
//!
//! # Example: Building a Traced Graph
//!
//! ```rust
//! use alsvid_ir::{
//!     AbstractValue, DeviceConfig, ElemKind, Graph, Literal, MeasurementKind, SourcePrim,
//! };
//!
//! // Trace of: RX(x, wire 0); expval(PauliZ(0))
//! let mut kernel: Graph<SourcePrim> = Graph::new();
//! let x = kernel.input(AbstractValue::scalar(ElemKind::F64));
//!
//! let op = kernel.push(
//!     SourcePrim::Gate { name: "RX".into(), n_params: 1, n_wires: 1 },
//!     vec![x.into(), Literal::I64(0).into()],
//!     vec![AbstractValue::operator()],
//! )[0];
//! # let _ = op;
//!
//! let obs = kernel.push(
//!     SourcePrim::NamedObs { name: "PauliZ".into(), n_wires: 1 },
//!     vec![Literal::I64(0).into()],
//!     vec![AbstractValue::observable()],
//! )[0];
//!
//! let ev = kernel.push(
//!     SourcePrim::Measure { kind: MeasurementKind::Expval, eigvals: None },
//!     vec![obs.into()],
//!     vec![AbstractValue::scalar(ElemKind::F64)],
//! )[0];
//! kernel.outputs = vec![ev.into()];
//!
//! kernel.validate().unwrap();
//! let dev = DeviceConfig::new("lightning.qubit", 2);
//! assert_eq!(dev.num_wires, 2);
//! ```

pub mod error;
pub mod graph;
pub mod source;
pub mod target;
pub mod value;

pub use error::{GraphError, GraphResult};
pub use graph::{Equation, Graph, Primitive};
pub use source::{
    ClassicalPrim, DeviceConfig, MeasurementKind, ObsArithKind, QnodeCall, SourcePrim,
};
pub use target::{KernelCall, ShotCount, TargetPrim};
pub use value::{AbstractValue, Dim, ElemKind, Literal, Operand, VarId};
