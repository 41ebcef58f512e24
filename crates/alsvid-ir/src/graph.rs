//! Generic equation graphs.
//!
//! Both the traced (source) and lowered (target) representations share one
//! graph shape: a single-pass-valid ordered list of equations over typed
//! variables, parameterized by the primitive vocabulary that populates it.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{GraphError, GraphResult};
use crate::value::{AbstractValue, Operand, VarId};

/// A primitive vocabulary usable as an equation tag.
pub trait Primitive {
    /// Human-readable name of the operation kind.
    fn name(&self) -> Cow<'_, str>;

    /// Declared output arity, if fixed by the primitive.
    ///
    /// `None` means the arity depends on context (e.g. a call equation whose
    /// outputs mirror its sub-graph's outputs) and is not checked.
    fn output_arity(&self) -> Option<usize> {
        None
    }
}

/// One typed operation over variables.
///
/// Output variables are fresh: no other equation in the same graph produces
/// them, and their abstract values are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation<P> {
    /// The operation kind, including any typed payload.
    pub prim: P,
    /// Ordered input operands.
    pub inputs: Vec<Operand>,
    /// Ordered output variables.
    pub outputs: Vec<VarId>,
}

/// A single-pass-valid sequence of equations with declared inputs and outputs.
///
/// Every variable referenced as an operand is either a graph input, a
/// literal, or the output of an earlier equation in program order. The graph
/// owns its variable namespace; variables of different graphs never alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph<P> {
    avals: Vec<AbstractValue>,
    /// Declared input variables, in signature order.
    pub inputs: Vec<VarId>,
    /// Equations in program order.
    pub eqns: Vec<Equation<P>>,
    /// Declared outputs, in signature order.
    pub outputs: Vec<Operand>,
}

impl<P> Default for Graph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Graph<P> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            avals: Vec::new(),
            inputs: Vec::new(),
            eqns: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Allocate a fresh variable with the given abstract value.
    pub fn fresh(&mut self, aval: AbstractValue) -> VarId {
        let id = VarId(u32::try_from(self.avals.len()).expect("variable count exceeds u32::MAX"));
        self.avals.push(aval);
        id
    }

    /// Allocate a fresh variable and declare it as a graph input.
    pub fn input(&mut self, aval: AbstractValue) -> VarId {
        let v = self.fresh(aval);
        self.inputs.push(v);
        v
    }

    /// The abstract value of a variable.
    ///
    /// # Panics
    ///
    /// Panics if the variable does not belong to this graph.
    pub fn aval(&self, var: VarId) -> &AbstractValue {
        &self.avals[var.index()]
    }

    /// The abstract value of an operand (variable lookup or literal-derived).
    pub fn operand_aval(&self, operand: &Operand) -> AbstractValue {
        match operand {
            Operand::Var(v) => self.aval(*v).clone(),
            Operand::Lit(l) => l.aval(),
        }
    }

    /// Total number of variables in the namespace.
    pub fn num_vars(&self) -> usize {
        self.avals.len()
    }

    /// Append an equation, allocating fresh output variables.
    ///
    /// Returns the allocated outputs in order.
    pub fn push(
        &mut self,
        prim: P,
        inputs: Vec<Operand>,
        out_avals: Vec<AbstractValue>,
    ) -> Vec<VarId> {
        let outputs: Vec<VarId> = out_avals.into_iter().map(|a| self.fresh(a)).collect();
        self.eqns.push(Equation {
            prim,
            inputs,
            outputs: outputs.clone(),
        });
        outputs
    }

    /// Append a pre-built equation.
    pub fn push_eqn(&mut self, eqn: Equation<P>) {
        self.eqns.push(eqn);
    }
}

impl<P: Primitive> Graph<P> {
    /// Check structural validity.
    ///
    /// Verifies that every operand is defined before use, that no variable
    /// has more than one producer, and that equation output counts match the
    /// primitives' declared arities.
    pub fn validate(&self) -> GraphResult<()> {
        let mut defined = vec![false; self.avals.len()];
        for &v in &self.inputs {
            *defined
                .get_mut(v.index())
                .ok_or(GraphError::UnknownVariable { var: v })? = true;
        }

        for (eqn_index, eqn) in self.eqns.iter().enumerate() {
            if let Some(expected) = eqn.prim.output_arity() {
                if eqn.outputs.len() != expected {
                    return Err(GraphError::OutputArityMismatch {
                        prim: eqn.prim.name().into_owned(),
                        eqn_index,
                        expected,
                        got: eqn.outputs.len(),
                    });
                }
            }

            for operand in &eqn.inputs {
                if let Operand::Var(v) = operand {
                    let seen = *defined
                        .get(v.index())
                        .ok_or(GraphError::UnknownVariable { var: *v })?;
                    if !seen {
                        return Err(GraphError::UndefinedOperand {
                            eqn_index,
                            var: *v,
                        });
                    }
                }
            }

            for &v in &eqn.outputs {
                let slot = defined
                    .get_mut(v.index())
                    .ok_or(GraphError::UnknownVariable { var: v })?;
                if *slot {
                    return Err(GraphError::RedefinedVariable { eqn_index, var: v });
                }
                *slot = true;
            }
        }

        for operand in &self.outputs {
            if let Operand::Var(v) = operand {
                let seen = *defined
                    .get(v.index())
                    .ok_or(GraphError::UnknownVariable { var: *v })?;
                if !seen {
                    return Err(GraphError::UndefinedOutput { var: *v });
                }
            }
        }

        Ok(())
    }
}
