//! Flattening of nested adjoint/control modifier wrappers.
//!
//! The traced representation encodes modifiers as wrapper equations pointing
//! at their operand's producing equation. Flattening walks that chain
//! backward over a producer map — linear in chain length — and folds every
//! wrapper into a single effective triple: adjoint parity, control wires,
//! control values.

use alsvid_ir::{Equation, Graph, Operand, SourcePrim, VarId};
use rustc_hash::FxHashMap;

use crate::error::{LowerError, LowerResult};

/// Map from each equation output variable to its producing equation's index.
pub type ProducerMap = FxHashMap<VarId, usize>;

/// Build the producer map for one graph.
pub fn producer_map(graph: &Graph<SourcePrim>) -> ProducerMap {
    let mut map = ProducerMap::default();
    for (index, eqn) in graph.eqns.iter().enumerate() {
        for &out in &eqn.outputs {
            map.insert(out, index);
        }
    }
    map
}

/// The flattened effect of zero or more modifier wrappers around one base
/// operator equation.
///
/// Control wires and values are ordered from the outermost wrapper to the
/// innermost, with the wire/value pairing preserved exactly. Order is
/// deterministic from nesting order alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierSpec {
    /// Adjoint parity: true iff an odd number of adjoint wrappers apply.
    pub adjoint: bool,
    /// Control wire operands, outermost wrapper first.
    pub control_wires: Vec<Operand>,
    /// Required control values, paired positionally with the wires.
    pub control_values: Vec<bool>,
}

impl ModifierSpec {
    /// Number of control wires.
    pub fn ctrl_len(&self) -> usize {
        self.control_wires.len()
    }

    /// Check if no modifier applies.
    pub fn is_trivial(&self) -> bool {
        !self.adjoint && self.control_wires.is_empty()
    }
}

/// Flatten the modifier chain starting at `eqn_index`.
///
/// Walks backward from the given equation while it is a modifier wrapper,
/// accumulating adjoint parity by XOR and concatenating control lists in
/// discovery (outer-to-inner) order. Returns the flattened spec together
/// with the base operator equation the chain terminates at.
pub fn flatten_modifiers<'g>(
    graph: &'g Graph<SourcePrim>,
    producers: &ProducerMap,
    eqn_index: usize,
) -> LowerResult<(ModifierSpec, &'g Equation<SourcePrim>)> {
    let mut spec = ModifierSpec::default();
    let mut eqn = &graph.eqns[eqn_index];

    loop {
        match &eqn.prim {
            SourcePrim::Adjoint => {
                spec.adjoint ^= true;
            }
            SourcePrim::Ctrl { control_values } => {
                if control_values.len() != eqn.inputs.len().saturating_sub(1) {
                    return Err(LowerError::InternalConsistency(format!(
                        "ctrl wrapper has {} control wires but {} control values",
                        eqn.inputs.len().saturating_sub(1),
                        control_values.len(),
                    )));
                }
                spec.control_wires.extend(eqn.inputs[1..].iter().cloned());
                spec.control_values.extend(control_values.iter().copied());
            }
            _ => return Ok((spec, eqn)),
        }

        // Follow the wrapped operand back to its producer.
        let wrapped = eqn.inputs.first().and_then(Operand::as_var).ok_or_else(|| {
            LowerError::InternalConsistency(
                "modifier wrapper has no bound operator operand".into(),
            )
        })?;
        let producer = *producers.get(&wrapped).ok_or_else(|| {
            LowerError::InternalConsistency(format!(
                "modifier wrapper operand {wrapped} has no producing equation"
            ))
        })?;
        eqn = &graph.eqns[producer];
    }
}
