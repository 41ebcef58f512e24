//! Lowering of one traced quantum sub-program into a kernel graph.
//!
//! Each sub-program is lowered in isolation: a fresh environment, a fresh
//! register allocated at kernel entry and released at kernel exit, and a
//! single register value threaded linearly through every instruction. The
//! walk visits equations in program order; operator equations whose output
//! is consumed by a later modifier wrapper are deferred and folded when the
//! outermost wrapper of their chain is reached.

use alsvid_ir::{
    AbstractValue, DeviceConfig, Dim, ElemKind, Equation, Graph, Literal, MeasurementKind,
    Operand, Primitive, ShotCount, SourcePrim, TargetPrim, VarId,
};
use tracing::{debug, trace};

use crate::env::Environment;
use crate::error::{LowerError, LowerResult};
use crate::modifier::{flatten_modifiers, producer_map, ModifierSpec, ProducerMap};

/// How the kernel's shot count resolves.
#[derive(Debug, Clone, Copy)]
enum Shots {
    /// Analytic device, no override.
    None,
    /// Device default, baked at lowering time.
    Static(u64),
    /// Runtime override threaded in as the kernel's leading input. `known`
    /// carries the value when the override operand is a literal, so output
    /// shapes can still be baked.
    Dynamic { var: VarId, known: Option<u64> },
}

pub(crate) struct KernelLowering<'a> {
    src: &'a Graph<SourcePrim>,
    device: &'a DeviceConfig,
    env: Environment,
    producers: ProducerMap,
    wrapped: Vec<bool>,
    qreg: VarId,
    shots: Shots,
}

impl<'a> KernelLowering<'a> {
    /// Lower one traced sub-program.
    ///
    /// `dynamic_shots` mirrors the call equation's flag; `shot_hint` is the
    /// override value when the outer shot operand is a compile-time literal.
    pub(crate) fn run(
        src: &'a Graph<SourcePrim>,
        device: &'a DeviceConfig,
        dynamic_shots: bool,
        shot_hint: Option<u64>,
    ) -> LowerResult<Graph<TargetPrim>> {
        debug!(device = %device.name, num_eqns = src.eqns.len(), "lowering kernel");

        let mut env = Environment::new();
        let shots = if dynamic_shots {
            let var = env.out.input(AbstractValue::scalar(ElemKind::I64));
            Shots::Dynamic {
                var,
                known: shot_hint,
            }
        } else if let Some(n) = device.shots {
            Shots::Static(n)
        } else {
            Shots::None
        };

        for &v in &src.inputs {
            let t = env.out.input(src.aval(v).clone());
            env.define(v, t)?;
        }

        let qreg = env.out.push(
            TargetPrim::QregAlloc {
                num_wires: device.num_wires,
            },
            vec![],
            vec![AbstractValue::qreg()],
        )[0];

        let mut lowering = Self {
            src,
            device,
            env,
            producers: producer_map(src),
            wrapped: mark_wrapped(src),
            qreg,
            shots,
        };
        lowering.lower_eqns()?;

        let final_qreg = lowering.qreg;
        lowering
            .env
            .out
            .push(TargetPrim::QregFree, vec![final_qreg.into()], vec![]);

        let outputs = lowering.env.remap_all(&src.outputs)?;
        let mut out = lowering.env.into_graph();
        out.outputs = outputs;

        debug!(num_eqns = out.eqns.len(), "kernel lowered");
        Ok(out)
    }

    fn lower_eqns(&mut self) -> LowerResult<()> {
        for (index, eqn) in self.src.eqns.iter().enumerate() {
            // Deferred: folded when the outermost wrapper is reached.
            if self.wrapped[index] {
                continue;
            }
            match &eqn.prim {
                SourcePrim::Gate { .. }
                | SourcePrim::Adjoint
                | SourcePrim::Ctrl { .. }
                | SourcePrim::BasisState { .. }
                | SourcePrim::StatePrep { .. } => self.lower_operator_chain(index)?,
                // Observables are lowered at the measurement that reads them.
                SourcePrim::NamedObs { .. } | SourcePrim::ObsArith { .. } => {}
                SourcePrim::Measure { kind, eigvals } => {
                    self.lower_measurement(eqn, *kind, eigvals.as_deref())?;
                }
                SourcePrim::Classical(p) => self.env.copy_classical(self.src, eqn, *p)?,
                SourcePrim::Qnode(_) => {
                    return Err(LowerError::InternalConsistency(
                        "sub-program call nested inside another sub-program".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn lower_operator_chain(&mut self, index: usize) -> LowerResult<()> {
        let (spec, base) = flatten_modifiers(self.src, &self.producers, index)?;
        match &base.prim {
            SourcePrim::Gate {
                name,
                n_params,
                n_wires,
            } => self.emit_inst(base, name, *n_params, *n_wires, &spec),
            SourcePrim::BasisState { n_wires } => {
                reject_modified(&spec, "basis_state")?;
                self.emit_init(base, TargetPrim::SetBasisState { n_wires: *n_wires })
            }
            SourcePrim::StatePrep { n_wires } => {
                reject_modified(&spec, "state_prep")?;
                self.emit_init(base, TargetPrim::SetState { n_wires: *n_wires })
            }
            other => Err(LowerError::MalformedModifierNesting {
                modifier: modifier_name(&spec).into(),
                base: other.name().into_owned(),
            }),
        }
    }

    /// Emit one flattened instruction and advance the register thread.
    fn emit_inst(
        &mut self,
        base: &Equation<SourcePrim>,
        name: &str,
        n_params: usize,
        n_wires: usize,
        spec: &ModifierSpec,
    ) -> LowerResult<()> {
        if base.inputs.len() != n_params + n_wires {
            return Err(LowerError::InternalConsistency(format!(
                "gate '{name}' declares {n_params} parameter(s) and {n_wires} wire(s), \
                 equation carries {} operand(s)",
                base.inputs.len()
            )));
        }
        let params = self.env.remap_all(&base.inputs[..n_params])?;
        let wires = self.env.remap_all(&base.inputs[n_params..n_params + n_wires])?;
        let ctrl_wires = self.env.remap_all(&spec.control_wires)?;

        let mut inputs = Vec::with_capacity(1 + n_wires + n_params + 2 * spec.ctrl_len());
        inputs.push(self.qreg.into());
        inputs.extend(wires);
        inputs.extend(params);
        inputs.extend(ctrl_wires);
        inputs.extend(
            spec.control_values
                .iter()
                .map(|&b| Operand::Lit(Literal::Bool(b))),
        );

        trace!(
            op = name,
            ctrl_len = spec.ctrl_len(),
            adjoint = spec.adjoint,
            "emit instruction"
        );
        let out = self.env.out.push(
            TargetPrim::Inst {
                name: name.to_string(),
                qubits_len: n_wires,
                params_len: n_params,
                ctrl_len: spec.ctrl_len(),
                adjoint: spec.adjoint,
            },
            inputs,
            vec![AbstractValue::qreg()],
        )[0];
        self.qreg = out;
        Ok(())
    }

    /// Emit a state/basis-state initialization and advance the register.
    fn emit_init(&mut self, base: &Equation<SourcePrim>, prim: TargetPrim) -> LowerResult<()> {
        let mut inputs = vec![Operand::from(self.qreg)];
        inputs.extend(self.env.remap_all(&base.inputs)?);
        let out = self
            .env
            .out
            .push(prim, inputs, vec![AbstractValue::qreg()])[0];
        self.qreg = out;
        Ok(())
    }

    fn lower_measurement(
        &mut self,
        eqn: &Equation<SourcePrim>,
        kind: MeasurementKind,
        eigvals: Option<&[f64]>,
    ) -> LowerResult<()> {
        if eigvals.is_some() {
            return Err(LowerError::UnsupportedMeasurementSpecification {
                kind: kind.name().into(),
                n_wires: eqn.inputs.len(),
            });
        }

        let result = match kind {
            MeasurementKind::Expval => self.lower_observable_measurement(eqn, kind)?,
            MeasurementKind::Variance => self.lower_observable_measurement(eqn, kind)?,
            MeasurementKind::Probs => {
                let wires = self.measured_wires(eqn)?;
                let n = wires.len();
                let mut inputs = vec![Operand::from(self.qreg)];
                inputs.extend(wires);
                self.env.out.push(
                    TargetPrim::Probs { n_wires: n },
                    inputs,
                    vec![AbstractValue::vector(ElemKind::F64, 1u64 << n)],
                )[0]
            }
            MeasurementKind::State => {
                if !eqn.inputs.is_empty() {
                    return Err(LowerError::UnsupportedWireRestrictedState {
                        n_wires: eqn.inputs.len(),
                    });
                }
                let n = self.device.num_wires;
                self.env.out.push(
                    TargetPrim::State { num_wires: n },
                    vec![self.qreg.into()],
                    vec![AbstractValue::vector(ElemKind::Complex128, 1u64 << n)],
                )[0]
            }
            MeasurementKind::Sample => self.lower_sample(eqn)?,
            MeasurementKind::Counts | MeasurementKind::VnEntropy => {
                return Err(LowerError::UnsupportedMeasurementKind {
                    kind: kind.name().into(),
                });
            }
        };

        let source_out = *eqn.outputs.first().ok_or_else(|| {
            LowerError::InternalConsistency("measurement equation with no output".into())
        })?;
        self.env.define(source_out, result)
    }

    /// Lower an expectation or variance over a named observable.
    fn lower_observable_measurement(
        &mut self,
        eqn: &Equation<SourcePrim>,
        kind: MeasurementKind,
    ) -> LowerResult<VarId> {
        let operand = eqn.inputs.first().ok_or_else(|| {
            LowerError::InternalConsistency("observable measurement with no operand".into())
        })?;
        let var = operand
            .as_var()
            .ok_or_else(|| LowerError::UnsupportedMeasurementTarget {
                kind: kind.name().into(),
            })?;
        let producer_index =
            *self
                .producers
                .get(&var)
                .ok_or_else(|| LowerError::UnsupportedMeasurementTarget {
                    kind: kind.name().into(),
                })?;

        let obs_eqn = &self.src.eqns[producer_index];
        let obs = match &obs_eqn.prim {
            SourcePrim::NamedObs { name, n_wires } => {
                let mut inputs = vec![Operand::from(self.qreg)];
                inputs.extend(self.env.remap_all(&obs_eqn.inputs)?);
                self.env.out.push(
                    TargetPrim::NamedObs {
                        name: name.clone(),
                        n_wires: *n_wires,
                    },
                    inputs,
                    vec![AbstractValue::observable()],
                )[0]
            }
            SourcePrim::ObsArith { kind: arith } => {
                return Err(LowerError::UnsupportedOperatorAlgebra {
                    measurement: kind.name().into(),
                    kind: arith.name().into(),
                });
            }
            _ => {
                return Err(LowerError::UnsupportedMeasurementTarget {
                    kind: kind.name().into(),
                });
            }
        };

        let prim = match kind {
            MeasurementKind::Expval => TargetPrim::Expval,
            MeasurementKind::Variance => TargetPrim::Variance,
            _ => unreachable!("only observable-valued kinds reach here"),
        };
        Ok(self.env.out.push(
            prim,
            vec![obs.into()],
            vec![AbstractValue::scalar(ElemKind::F64)],
        )[0])
    }

    fn lower_sample(&mut self, eqn: &Equation<SourcePrim>) -> LowerResult<VarId> {
        let wires = self.measured_wires(eqn)?;
        let w = wires.len();
        let mut inputs = vec![Operand::from(self.qreg)];
        inputs.extend(wires);

        let (shots, leading) = match self.shots {
            Shots::Static(n) => (ShotCount::Static(n), Dim::Known(n)),
            Shots::Dynamic { var, known } => {
                inputs.push(var.into());
                (
                    ShotCount::Dynamic,
                    known.map_or(Dim::Dynamic, Dim::Known),
                )
            }
            Shots::None => {
                return Err(LowerError::MissingShotCount {
                    device: self.device.name.clone(),
                });
            }
        };

        Ok(self.env.out.push(
            TargetPrim::Sample {
                n_wires: w,
                shots,
            },
            inputs,
            vec![AbstractValue::matrix(
                ElemKind::F64,
                leading,
                Dim::Known(w as u64),
            )],
        )[0])
    }

    /// The measurement's wire operands, remapped; defaults to every device
    /// wire when the traced measurement names none.
    fn measured_wires(&self, eqn: &Equation<SourcePrim>) -> LowerResult<Vec<Operand>> {
        if eqn.inputs.is_empty() {
            Ok((0..self.device.num_wires)
                .map(|w| Literal::I64(i64::from(w)).into())
                .collect())
        } else {
            self.env.remap_all(&eqn.inputs)
        }
    }
}

/// Mark equations whose operator output is consumed by a later modifier
/// wrapper; those are lowered when their outermost wrapper is reached.
fn mark_wrapped(src: &Graph<SourcePrim>) -> Vec<bool> {
    let producers = producer_map(src);
    let mut wrapped = vec![false; src.eqns.len()];
    for eqn in &src.eqns {
        if !eqn.prim.is_modifier() {
            continue;
        }
        if let Some(v) = eqn.inputs.first().and_then(Operand::as_var) {
            if let Some(&idx) = producers.get(&v) {
                wrapped[idx] = true;
            }
        }
    }
    wrapped
}

fn modifier_name(spec: &ModifierSpec) -> &'static str {
    if spec.control_wires.is_empty() {
        "adjoint"
    } else {
        "ctrl"
    }
}

fn reject_modified(spec: &ModifierSpec, base: &str) -> LowerResult<()> {
    if spec.is_trivial() {
        return Ok(());
    }
    Err(LowerError::MalformedModifierNesting {
        modifier: modifier_name(spec).into(),
        base: base.into(),
    })
}
