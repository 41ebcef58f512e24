//! Translation environment: source-to-target variable mapping plus the
//! target graph under construction.
//!
//! One environment is scoped to one (sub-)graph translation and discarded
//! when it completes; nested kernels get their own. Literals pass through
//! unmapped — only bound variables are remapped.

use alsvid_ir::{
    AbstractValue, ClassicalPrim, Equation, Graph, Operand, SourcePrim, TargetPrim, VarId,
};
use rustc_hash::FxHashMap;

use crate::error::{LowerError, LowerResult};

/// Variable mapper and target-graph builder for one translation scope.
#[derive(Debug, Default)]
pub struct Environment {
    map: FxHashMap<VarId, VarId>,
    /// The target graph being built.
    pub out: Graph<TargetPrim>,
}

impl Environment {
    /// Create an empty environment with an empty target graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the target counterpart of a source variable.
    ///
    /// Fails if the source variable was never mapped, which indicates a
    /// malformed source graph or a bug in the pass.
    pub fn bind(&self, source: VarId) -> LowerResult<VarId> {
        self.map.get(&source).copied().ok_or_else(|| {
            LowerError::InternalConsistency(format!(
                "source variable {source} has no target mapping"
            ))
        })
    }

    /// Record a new source-to-target mapping.
    ///
    /// Fails if the source variable is already mapped: each source variable
    /// is translated exactly once.
    pub fn define(&mut self, source: VarId, target: VarId) -> LowerResult<()> {
        if self.map.insert(source, target).is_some() {
            return Err(LowerError::InternalConsistency(format!(
                "source variable {source} mapped twice"
            )));
        }
        Ok(())
    }

    /// Allocate a target variable with no source counterpart.
    ///
    /// Used for intermediate register values and other pass-introduced
    /// variables.
    pub fn fresh(&mut self, aval: AbstractValue) -> VarId {
        self.out.fresh(aval)
    }

    /// Allocate a target variable and map a source variable to it.
    pub fn define_fresh(&mut self, source: VarId, aval: AbstractValue) -> LowerResult<VarId> {
        let target = self.out.fresh(aval);
        self.define(source, target)?;
        Ok(target)
    }

    /// Remap a source operand into the target namespace.
    ///
    /// Bound variables go through the mapping table; literals are copied
    /// through unchanged.
    pub fn remap(&self, operand: &Operand) -> LowerResult<Operand> {
        match operand {
            Operand::Var(v) => Ok(Operand::Var(self.bind(*v)?)),
            Operand::Lit(l) => Ok(Operand::Lit(l.clone())),
        }
    }

    /// Remap a slice of source operands in order.
    pub fn remap_all(&self, operands: &[Operand]) -> LowerResult<Vec<Operand>> {
        operands.iter().map(|o| self.remap(o)).collect()
    }

    /// Copy a classical equation through with remapped operands.
    ///
    /// Output variables are allocated fresh in the target graph with the
    /// source equation's abstract values and the mapping is recorded.
    pub fn copy_classical(
        &mut self,
        src: &Graph<SourcePrim>,
        eqn: &Equation<SourcePrim>,
        prim: ClassicalPrim,
    ) -> LowerResult<()> {
        let inputs = self.remap_all(&eqn.inputs)?;
        let avals = eqn
            .outputs
            .iter()
            .map(|&v| src.aval(v).clone())
            .collect::<Vec<_>>();
        let outs = self.out.push(TargetPrim::Classical(prim), inputs, avals);
        for (&s, &t) in eqn.outputs.iter().zip(&outs) {
            self.define(s, t)?;
        }
        Ok(())
    }

    /// Consume the environment, yielding the finished target graph.
    pub fn into_graph(self) -> Graph<TargetPrim> {
        self.out
    }
}
