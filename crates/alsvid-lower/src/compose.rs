//! Top-level composition: walking the outer classical graph and embedding
//! one kernel-call equation per traced sub-program.
//!
//! Classical equations surrounding the sub-programs are copied through
//! verbatim with remapped operands; the pass does not interpret how the
//! surrounding computation combines kernel results. Each sub-program is
//! lowered with its own environment and register thread, so independent
//! kernels never share variables.

use alsvid_ir::{
    AbstractValue, Equation, Graph, KernelCall, Literal, Primitive, QnodeCall, SourcePrim,
    TargetPrim,
};
use tracing::debug;

use crate::env::Environment;
use crate::error::{LowerError, LowerResult};
use crate::kernel::KernelLowering;

/// Lower a traced workflow graph into its kernel-form counterpart.
///
/// The result has the same number and order of declared outputs as the
/// source. On any unsupported construct a [`LowerError`] is returned and no
/// partial graph is produced.
pub fn lower_graph(src: &Graph<SourcePrim>) -> LowerResult<Graph<TargetPrim>> {
    src.validate()?;
    debug!(
        num_eqns = src.eqns.len(),
        num_outputs = src.outputs.len(),
        "lowering workflow graph"
    );

    let mut env = Environment::new();
    for &v in &src.inputs {
        let t = env.out.input(src.aval(v).clone());
        env.define(v, t)?;
    }

    for eqn in &src.eqns {
        match &eqn.prim {
            SourcePrim::Qnode(call) => lower_call(&mut env, eqn, call)?,
            SourcePrim::Classical(p) => env.copy_classical(src, eqn, *p)?,
            other => {
                return Err(LowerError::InternalConsistency(format!(
                    "quantum primitive '{}' outside a sub-program call",
                    other.name()
                )));
            }
        }
    }

    let outputs = env.remap_all(&src.outputs)?;
    let mut out = env.into_graph();
    out.outputs = outputs;
    Ok(out)
}

/// Lower one traced sub-program call into a kernel-call equation.
fn lower_call(
    env: &mut Environment,
    eqn: &Equation<SourcePrim>,
    call: &QnodeCall,
) -> LowerResult<()> {
    call.graph.validate()?;

    // Split off the runtime shot override, if the call carries one, and
    // bake its value into output shapes when it is a literal.
    let (shot_operand, shot_hint, args) = if call.dynamic_shots {
        let operand = eqn.inputs.first().ok_or_else(|| {
            LowerError::InternalConsistency("dynamic-shot call without a shot operand".into())
        })?;
        let hint = operand
            .as_lit()
            .and_then(Literal::as_i64)
            .and_then(|n| u64::try_from(n).ok());
        (Some(operand), hint, &eqn.inputs[1..])
    } else {
        (None, None, &eqn.inputs[..])
    };

    if args.len() != call.graph.inputs.len() {
        return Err(LowerError::InternalConsistency(format!(
            "sub-program call passes {} argument(s), its graph declares {}",
            args.len(),
            call.graph.inputs.len()
        )));
    }

    let kernel = KernelLowering::run(&call.graph, &call.device, call.dynamic_shots, shot_hint)?;

    // The kernel-call equation's outputs take the lowered kernel's declared
    // output avals, which reflect dynamic shot shapes where derivable.
    let out_avals: Vec<AbstractValue> = kernel
        .outputs
        .iter()
        .map(|o| kernel.operand_aval(o))
        .collect();
    if out_avals.len() != eqn.outputs.len() {
        return Err(LowerError::InternalConsistency(format!(
            "sub-program declares {} output(s), traced call binds {}",
            out_avals.len(),
            eqn.outputs.len()
        )));
    }

    let mut inputs = Vec::with_capacity(eqn.inputs.len());
    if let Some(operand) = shot_operand {
        inputs.push(env.remap(operand)?);
    }
    for arg in args {
        inputs.push(env.remap(arg)?);
    }

    let outs = env.out.push(
        TargetPrim::Kernel(Box::new(KernelCall {
            graph: kernel,
            device: call.device.clone(),
        })),
        inputs,
        out_avals,
    );
    for (&s, &t) in eqn.outputs.iter().zip(&outs) {
        env.define(s, t)?;
    }
    Ok(())
}
