//! Integration tests for lowering complete hybrid workflows.
//!
//! These tests drive the public `lower_graph` entry point on traced
//! workflows — classical pre/post-processing around one or more quantum
//! sub-programs — and pin down the lowered kernel equation layouts, the
//! modifier flattening laws, the dynamic-shot shape rules, and the
//! rejection diagnostics.

use alsvid_ir::{
    AbstractValue, ClassicalPrim, DeviceConfig, Dim, ElemKind, Graph, KernelCall, Literal,
    MeasurementKind, Operand, Primitive, QnodeCall, ShotCount, SourcePrim, TargetPrim, VarId,
};
use alsvid_lower::{lower_graph, LowerError};

fn f64_scalar() -> AbstractValue {
    AbstractValue::scalar(ElemKind::F64)
}

fn gate(name: &str, n_params: usize, n_wires: usize) -> SourcePrim {
    SourcePrim::Gate {
        name: name.into(),
        n_params,
        n_wires,
    }
}

fn named_obs(name: &str) -> SourcePrim {
    SourcePrim::NamedObs {
        name: name.into(),
        n_wires: 1,
    }
}

fn measure(kind: MeasurementKind) -> SourcePrim {
    SourcePrim::Measure {
        kind,
        eigvals: None,
    }
}

fn wire(w: i64) -> Operand {
    Literal::I64(w).into()
}

/// Wrap a traced kernel in a single-call workflow with `n_args` scalar
/// arguments passed straight through.
fn single_call_workflow(call: QnodeCall, out_avals: Vec<AbstractValue>) -> Graph<SourcePrim> {
    let n_args = call.graph.inputs.len();
    let mut wf: Graph<SourcePrim> = Graph::new();
    let args: Vec<Operand> = (0..n_args)
        .map(|_| Operand::from(wf.input(f64_scalar())))
        .collect();
    let outs = wf.push(SourcePrim::Qnode(Box::new(call)), args, out_avals);
    wf.outputs = outs.into_iter().map(Operand::from).collect();
    wf
}

/// The embedded kernel graph of the workflow's first kernel-call equation.
fn first_kernel(lowered: &Graph<TargetPrim>) -> &KernelCall {
    lowered
        .eqns
        .iter()
        .find_map(|e| match &e.prim {
            TargetPrim::Kernel(k) => Some(k.as_ref()),
            _ => None,
        })
        .expect("lowered workflow contains no kernel call")
}

/// Names of a graph's equations in program order.
fn eqn_names<P: Primitive>(g: &Graph<P>) -> Vec<String> {
    g.eqns.iter().map(|e| e.prim.name().into_owned()).collect()
}

/// The register variables consumed by register-threading equations, in order.
fn register_thread(kernel: &Graph<TargetPrim>) -> Vec<(VarId, VarId)> {
    kernel
        .eqns
        .iter()
        .filter(|e| e.prim.threads_register())
        .map(|e| (e.inputs[0].as_var().unwrap(), e.outputs[0]))
        .collect()
}

// ============================================================================
// Kernel equation layout
// ============================================================================

#[test]
fn test_rx_expval_workflow_layout() {
    // workflow(x) = qnode(x); qnode: RX(x, 0); expval(PauliZ(0))
    let mut kg: Graph<SourcePrim> = Graph::new();
    let x = kg.input(f64_scalar());
    kg.push(
        gate("RX", 1, 1),
        vec![x.into(), wire(0)],
        vec![AbstractValue::operator()],
    );
    let obs = kg.push(named_obs("PauliZ"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let ev = kg.push(
        measure(MeasurementKind::Expval),
        vec![obs.into()],
        vec![f64_scalar()],
    )[0];
    kg.outputs = vec![ev.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 2),
            dynamic_shots: false,
        },
        vec![f64_scalar()],
    );

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();

    // One kernel-call equation, outputs matching the source signature.
    assert_eq!(eqn_names(&lowered), vec!["kernel"]);
    assert_eq!(lowered.outputs.len(), 1);
    assert_eq!(lowered.operand_aval(&lowered.outputs[0]), f64_scalar());

    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();
    assert_eq!(
        eqn_names(kernel),
        vec!["qreg_alloc", "RX", "PauliZ", "expval", "qreg_free"]
    );

    // The register closes: the free equation consumes the RX output.
    let free = kernel.eqns.last().unwrap();
    assert_eq!(free.inputs[0].as_var(), Some(kernel.eqns[1].outputs[0]));
}

#[test]
fn test_multiple_measurements_preserve_output_order() {
    // qnode: Rot(x, y, z, 0); expval(PauliX(0)), expval(PauliY(0)), probs(0)
    let mut kg: Graph<SourcePrim> = Graph::new();
    let x = kg.input(f64_scalar());
    let y = kg.input(f64_scalar());
    let z = kg.input(f64_scalar());
    kg.push(
        gate("Rot", 3, 1),
        vec![x.into(), y.into(), z.into(), wire(0)],
        vec![AbstractValue::operator()],
    );
    let ox = kg.push(named_obs("PauliX"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let oy = kg.push(named_obs("PauliY"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let e1 = kg.push(
        measure(MeasurementKind::Expval),
        vec![ox.into()],
        vec![f64_scalar()],
    )[0];
    let e2 = kg.push(
        measure(MeasurementKind::Expval),
        vec![oy.into()],
        vec![f64_scalar()],
    )[0];
    let pr = kg.push(
        measure(MeasurementKind::Probs),
        vec![wire(0)],
        vec![AbstractValue::vector(ElemKind::F64, 2)],
    )[0];
    kg.outputs = vec![e1.into(), e2.into(), pr.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 2),
            dynamic_shots: false,
        },
        vec![
            f64_scalar(),
            f64_scalar(),
            AbstractValue::vector(ElemKind::F64, 2),
        ],
    );

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();
    assert_eq!(lowered.outputs.len(), 3);
    assert_eq!(lowered.operand_aval(&lowered.outputs[0]), f64_scalar());
    assert_eq!(lowered.operand_aval(&lowered.outputs[1]), f64_scalar());
    assert_eq!(
        lowered.operand_aval(&lowered.outputs[2]),
        AbstractValue::vector(ElemKind::F64, 2)
    );

    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();
    assert_eq!(
        eqn_names(kernel),
        vec![
            "qreg_alloc",
            "Rot",
            "PauliX",
            "expval",
            "PauliY",
            "expval",
            "probs",
            "qreg_free"
        ]
    );
}

#[test]
fn test_state_prep_initialization() {
    let amps = Literal::C128Vec(vec![
        num_complex::Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0),
        num_complex::Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0),
    ]);
    let mut kg: Graph<SourcePrim> = Graph::new();
    kg.push(
        SourcePrim::StatePrep { n_wires: 1 },
        vec![amps.clone().into(), wire(0)],
        vec![AbstractValue::operator()],
    );
    let st = kg.push(
        measure(MeasurementKind::State),
        vec![],
        vec![AbstractValue::vector(ElemKind::Complex128, 2)],
    )[0];
    kg.outputs = vec![st.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 1),
            dynamic_shots: false,
        },
        vec![AbstractValue::vector(ElemKind::Complex128, 2)],
    );

    let lowered = lower_graph(&wf).unwrap();
    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();
    assert_eq!(
        eqn_names(kernel),
        vec!["qreg_alloc", "set_state", "state", "qreg_free"]
    );
    let init = &kernel.eqns[1];
    assert!(matches!(init.prim, TargetPrim::SetState { n_wires: 1 }));
    assert_eq!(init.inputs[1], amps.into());
}

// ============================================================================
// Modifier flattening through the full pass
// ============================================================================

#[test]
fn test_triple_control_instruction_operands() {
    // qnode(x): ctrl(RX(x, 0), (1, 2, 3), [false, true, false]); state()
    let mut kg: Graph<SourcePrim> = Graph::new();
    let x = kg.input(f64_scalar());
    let op = kg.push(
        gate("RX", 1, 1),
        vec![x.into(), wire(0)],
        vec![AbstractValue::operator()],
    )[0];
    kg.push(
        SourcePrim::Ctrl {
            control_values: vec![false, true, false],
        },
        vec![op.into(), wire(1), wire(2), wire(3)],
        vec![AbstractValue::operator()],
    );
    let st = kg.push(
        measure(MeasurementKind::State),
        vec![],
        vec![AbstractValue::vector(ElemKind::Complex128, 16)],
    )[0];
    kg.outputs = vec![st.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 4),
            dynamic_shots: false,
        },
        vec![AbstractValue::vector(ElemKind::Complex128, 16)],
    );

    let lowered = lower_graph(&wf).unwrap();
    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();

    let inst = kernel
        .eqns
        .iter()
        .find(|e| matches!(e.prim, TargetPrim::Inst { .. }))
        .unwrap();
    assert!(matches!(
        &inst.prim,
        TargetPrim::Inst { name, qubits_len: 1, params_len: 1, ctrl_len: 3, adjoint: false }
            if name == "RX"
    ));

    // Operand layout: [qreg, target wire, param, ctrl wires.., ctrl values..]
    assert!(kernel.operand_aval(&inst.inputs[0]).is_qreg());
    assert_eq!(inst.inputs[1], wire(0));
    assert_eq!(inst.inputs[2].as_var(), Some(kernel.inputs[0]));
    assert_eq!(inst.inputs[3], wire(1));
    assert_eq!(inst.inputs[4], wire(2));
    assert_eq!(inst.inputs[5], wire(3));
    assert_eq!(inst.inputs[6], Literal::Bool(false).into());
    assert_eq!(inst.inputs[7], Literal::Bool(true).into());
    assert_eq!(inst.inputs[8], Literal::Bool(false).into());
}

#[test]
fn test_adjoint_around_controlled_gate() {
    // adjoint(ctrl(adjoint(RX(x, 0)), wires)) keeps ctrl_len and cancels
    // the two adjoints.
    for (inner, outer) in [(false, false), (true, false), (false, true), (true, true)] {
        let mut kg: Graph<SourcePrim> = Graph::new();
        let x = kg.input(f64_scalar());
        let mut op = kg.push(
            gate("RX", 1, 1),
            vec![x.into(), wire(0)],
            vec![AbstractValue::operator()],
        )[0];
        if inner {
            op = kg.push(
                SourcePrim::Adjoint,
                vec![op.into()],
                vec![AbstractValue::operator()],
            )[0];
        }
        op = kg.push(
            SourcePrim::Ctrl {
                control_values: vec![true],
            },
            vec![op.into(), wire(1)],
            vec![AbstractValue::operator()],
        )[0];
        if outer {
            kg.push(
                SourcePrim::Adjoint,
                vec![op.into()],
                vec![AbstractValue::operator()],
            );
        }
        let st = kg.push(
            measure(MeasurementKind::State),
            vec![],
            vec![AbstractValue::vector(ElemKind::Complex128, 4)],
        )[0];
        kg.outputs = vec![st.into()];

        let wf = single_call_workflow(
            QnodeCall {
                graph: kg,
                device: DeviceConfig::new("lightning.qubit", 2),
                dynamic_shots: false,
            },
            vec![AbstractValue::vector(ElemKind::Complex128, 4)],
        );

        let lowered = lower_graph(&wf).unwrap();
        let kernel = &first_kernel(&lowered).graph;
        kernel.validate().unwrap();

        let insts: Vec<_> = kernel
            .eqns
            .iter()
            .filter(|e| matches!(e.prim, TargetPrim::Inst { .. }))
            .collect();
        assert_eq!(insts.len(), 1, "one flattened instruction per chain");
        assert!(matches!(
            &insts[0].prim,
            TargetPrim::Inst { ctrl_len: 1, adjoint, .. }
                if *adjoint == ((inner as u32 + outer as u32) % 2 == 1)
        ));
    }
}

#[test]
fn test_doubly_controlled_outer_wires_first() {
    // ctrl(ctrl(S(0), 1), 2, control_values=[false])
    let mut kg: Graph<SourcePrim> = Graph::new();
    let base = kg.push(gate("S", 0, 1), vec![wire(0)], vec![AbstractValue::operator()])[0];
    let inner = kg.push(
        SourcePrim::Ctrl {
            control_values: vec![true],
        },
        vec![base.into(), wire(1)],
        vec![AbstractValue::operator()],
    )[0];
    kg.push(
        SourcePrim::Ctrl {
            control_values: vec![false],
        },
        vec![inner.into(), wire(2)],
        vec![AbstractValue::operator()],
    );
    let st = kg.push(
        measure(MeasurementKind::State),
        vec![],
        vec![AbstractValue::vector(ElemKind::Complex128, 8)],
    )[0];
    kg.outputs = vec![st.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 3),
            dynamic_shots: false,
        },
        vec![AbstractValue::vector(ElemKind::Complex128, 8)],
    );

    let lowered = lower_graph(&wf).unwrap();
    let kernel = &first_kernel(&lowered).graph;
    let inst = kernel
        .eqns
        .iter()
        .find(|e| matches!(e.prim, TargetPrim::Inst { .. }))
        .unwrap();
    assert!(matches!(
        &inst.prim,
        TargetPrim::Inst { name, qubits_len: 1, params_len: 0, ctrl_len: 2, adjoint: false }
            if name == "S"
    ));
    // Outer wrapper's wire (2) precedes the inner wrapper's (1), values pair up.
    assert_eq!(inst.inputs[2], wire(2));
    assert_eq!(inst.inputs[3], wire(1));
    assert_eq!(inst.inputs[4], Literal::Bool(false).into());
    assert_eq!(inst.inputs[5], Literal::Bool(true).into());
}

// ============================================================================
// Shot handling
// ============================================================================

#[test]
fn test_dynamic_shot_override_bakes_literal_shape() {
    // Device default 50 shots, call overrides with literal 100:
    // the declared sample shape becomes (100, 1).
    let mut kg: Graph<SourcePrim> = Graph::new();
    let s = kg.push(
        measure(MeasurementKind::Sample),
        vec![wire(0)],
        vec![AbstractValue::matrix(ElemKind::F64, Dim::Known(50), Dim::Known(1))],
    )[0];
    kg.outputs = vec![s.into()];

    let mut wf: Graph<SourcePrim> = Graph::new();
    let call = QnodeCall {
        graph: kg,
        device: DeviceConfig::with_shots("lightning.qubit", 2, 50),
        dynamic_shots: true,
    };
    let out = wf.push(
        SourcePrim::Qnode(Box::new(call)),
        vec![Literal::I64(100).into()],
        vec![AbstractValue::matrix(ElemKind::F64, Dim::Known(100), Dim::Known(1))],
    )[0];
    wf.outputs = vec![out.into()];

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();
    assert_eq!(
        lowered.operand_aval(&lowered.outputs[0]),
        AbstractValue::matrix(ElemKind::F64, Dim::Known(100), Dim::Known(1))
    );

    // The kernel call passes the override through as its first operand.
    let call_eqn = &lowered.eqns[0];
    assert_eq!(call_eqn.inputs[0], Literal::I64(100).into());

    // And the sample instruction carries the shot count as an operand, not
    // a baked parameter.
    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();
    let sample = kernel
        .eqns
        .iter()
        .find(|e| matches!(e.prim, TargetPrim::Sample { .. }))
        .unwrap();
    assert!(matches!(
        sample.prim,
        TargetPrim::Sample { n_wires: 1, shots: ShotCount::Dynamic }
    ));
    assert_eq!(sample.inputs.last().unwrap().as_var(), Some(kernel.inputs[0]));
}

#[test]
fn test_dynamic_shot_override_from_runtime_value() {
    // When the override is a runtime variable, the leading sample extent
    // is dynamic.
    let mut kg: Graph<SourcePrim> = Graph::new();
    let s = kg.push(
        measure(MeasurementKind::Sample),
        vec![wire(0)],
        vec![AbstractValue::matrix(ElemKind::F64, Dim::Dynamic, Dim::Known(1))],
    )[0];
    kg.outputs = vec![s.into()];

    let mut wf: Graph<SourcePrim> = Graph::new();
    let shots = wf.input(AbstractValue::scalar(ElemKind::I64));
    let call = QnodeCall {
        graph: kg,
        device: DeviceConfig::with_shots("lightning.qubit", 2, 50),
        dynamic_shots: true,
    };
    let out = wf.push(
        SourcePrim::Qnode(Box::new(call)),
        vec![shots.into()],
        vec![AbstractValue::matrix(ElemKind::F64, Dim::Dynamic, Dim::Known(1))],
    )[0];
    wf.outputs = vec![out.into()];

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();
    assert_eq!(
        lowered.operand_aval(&lowered.outputs[0]),
        AbstractValue::matrix(ElemKind::F64, Dim::Dynamic, Dim::Known(1))
    );
}

// ============================================================================
// Hybrid workflows
// ============================================================================

#[test]
fn test_pre_post_processing_workflow() {
    // workflow(z): y = 2 * z; (a, b) = qnode(z, y); a + b
    let mut kg: Graph<SourcePrim> = Graph::new();
    let p0 = kg.input(f64_scalar());
    let p1 = kg.input(f64_scalar());
    kg.push(
        gate("RX", 1, 1),
        vec![p0.into(), wire(0)],
        vec![AbstractValue::operator()],
    );
    kg.push(
        gate("RY", 1, 1),
        vec![p1.into(), wire(1)],
        vec![AbstractValue::operator()],
    );
    kg.push(
        gate("CNOT", 0, 2),
        vec![wire(0), wire(1)],
        vec![AbstractValue::operator()],
    );
    let ox = kg.push(named_obs("PauliX"), vec![wire(1)], vec![AbstractValue::observable()])[0];
    let oy = kg.push(named_obs("PauliY"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let a = kg.push(
        measure(MeasurementKind::Expval),
        vec![ox.into()],
        vec![f64_scalar()],
    )[0];
    let b = kg.push(
        measure(MeasurementKind::Expval),
        vec![oy.into()],
        vec![f64_scalar()],
    )[0];
    kg.outputs = vec![a.into(), b.into()];

    let mut wf: Graph<SourcePrim> = Graph::new();
    let z = wf.input(f64_scalar());
    let y = wf.push(
        SourcePrim::Classical(ClassicalPrim::Mul),
        vec![z.into(), Literal::F64(2.0).into()],
        vec![f64_scalar()],
    )[0];
    let call = QnodeCall {
        graph: kg,
        device: DeviceConfig::new("lightning.qubit", 2),
        dynamic_shots: false,
    };
    let results = wf.push(
        SourcePrim::Qnode(Box::new(call)),
        vec![z.into(), y.into()],
        vec![f64_scalar(), f64_scalar()],
    );
    let total = wf.push(
        SourcePrim::Classical(ClassicalPrim::Add),
        vec![results[0].into(), results[1].into()],
        vec![f64_scalar()],
    )[0];
    wf.outputs = vec![total.into()];

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();
    assert_eq!(eqn_names(&lowered), vec!["mul", "kernel", "add"]);

    // The kernel call consumes the workflow input and the mul result.
    let call_eqn = &lowered.eqns[1];
    assert_eq!(call_eqn.inputs[0].as_var(), Some(lowered.inputs[0]));
    assert_eq!(call_eqn.inputs[1].as_var(), Some(lowered.eqns[0].outputs[0]));

    // The addition combines the two kernel outputs.
    let add_eqn = &lowered.eqns[2];
    assert_eq!(add_eqn.inputs[0].as_var(), Some(call_eqn.outputs[0]));
    assert_eq!(add_eqn.inputs[1].as_var(), Some(call_eqn.outputs[1]));

    // Three instructions inside the kernel, register threaded linearly.
    let kernel = &first_kernel(&lowered).graph;
    kernel.validate().unwrap();
    let thread = register_thread(kernel);
    assert_eq!(thread.len(), 3);
    for pair in thread.windows(2) {
        assert_eq!(pair[1].0, pair[0].1);
    }
}

#[test]
fn test_two_kernels_summed() {
    // workflow(x, y) = f(x) + g(y), two independent single-wire qnodes.
    fn scalar_qnode(gate_name: &str, obs_name: &str, num_wires: u32) -> QnodeCall {
        let mut kg: Graph<SourcePrim> = Graph::new();
        let p = kg.input(f64_scalar());
        kg.push(
            gate(gate_name, 1, 1),
            vec![p.into(), wire(0)],
            vec![AbstractValue::operator()],
        );
        let obs = kg.push(named_obs(obs_name), vec![wire(0)], vec![AbstractValue::observable()])[0];
        let ev = kg.push(
            measure(MeasurementKind::Expval),
            vec![obs.into()],
            vec![f64_scalar()],
        )[0];
        kg.outputs = vec![ev.into()];
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", num_wires),
            dynamic_shots: false,
        }
    }

    let mut wf: Graph<SourcePrim> = Graph::new();
    let x = wf.input(f64_scalar());
    let y = wf.input(f64_scalar());
    let a = wf.push(
        SourcePrim::Qnode(Box::new(scalar_qnode("RX", "PauliY", 1))),
        vec![x.into()],
        vec![f64_scalar()],
    )[0];
    let b = wf.push(
        SourcePrim::Qnode(Box::new(scalar_qnode("RY", "PauliZ", 2))),
        vec![y.into()],
        vec![f64_scalar()],
    )[0];
    let sum = wf.push(
        SourcePrim::Classical(ClassicalPrim::Add),
        vec![a.into(), b.into()],
        vec![f64_scalar()],
    )[0];
    wf.outputs = vec![sum.into()];

    let lowered = lower_graph(&wf).unwrap();
    lowered.validate().unwrap();
    assert_eq!(eqn_names(&lowered), vec!["kernel", "kernel", "add"]);

    // Each kernel owns its register thread; no variables cross between the
    // two embedded graphs (they live in separate namespaces by
    // construction) and each closes its own register.
    for eqn in &lowered.eqns[..2] {
        let TargetPrim::Kernel(call) = &eqn.prim else {
            unreachable!()
        };
        call.graph.validate().unwrap();
        let names = eqn_names(&call.graph);
        assert_eq!(names.first().map(String::as_str), Some("qreg_alloc"));
        assert_eq!(names.last().map(String::as_str), Some("qreg_free"));
    }

    // The devices were carried through per call.
    let TargetPrim::Kernel(first) = &lowered.eqns[0].prim else {
        unreachable!()
    };
    let TargetPrim::Kernel(second) = &lowered.eqns[1].prim else {
        unreachable!()
    };
    assert_eq!(first.device.num_wires, 1);
    assert_eq!(second.device.num_wires, 2);
}

// ============================================================================
// Rejection diagnostics through the full pass
// ============================================================================

#[test]
fn test_expval_of_operator_sum_rejected() {
    let mut kg: Graph<SourcePrim> = Graph::new();
    let ox = kg.push(named_obs("PauliX"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let oy = kg.push(named_obs("PauliY"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let sum = kg.push(
        SourcePrim::ObsArith {
            kind: alsvid_ir::ObsArithKind::Sum,
        },
        vec![ox.into(), oy.into()],
        vec![AbstractValue::observable()],
    )[0];
    let ev = kg.push(
        measure(MeasurementKind::Expval),
        vec![sum.into()],
        vec![f64_scalar()],
    )[0];
    kg.outputs = vec![ev.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 2),
            dynamic_shots: false,
        },
        vec![f64_scalar()],
    );

    let err = lower_graph(&wf).unwrap_err();
    assert!(matches!(err, LowerError::UnsupportedOperatorAlgebra { .. }));
    // The diagnostic names both the measurement and the arithmetic kind.
    let msg = err.to_string();
    assert!(msg.contains("expval"), "{msg}");
    assert!(msg.contains("sum"), "{msg}");
}

#[test]
fn test_counts_measurement_rejected() {
    let mut kg: Graph<SourcePrim> = Graph::new();
    let c = kg.push(measure(MeasurementKind::Counts), vec![], vec![f64_scalar()])[0];
    kg.outputs = vec![c.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::with_shots("lightning.qubit", 2, 50),
            dynamic_shots: false,
        },
        vec![f64_scalar()],
    );

    let err = lower_graph(&wf).unwrap_err();
    assert!(matches!(
        err,
        LowerError::UnsupportedMeasurementKind { ref kind } if kind == "counts"
    ));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_lowered_graph_serde_round_trip() {
    let mut kg: Graph<SourcePrim> = Graph::new();
    let x = kg.input(f64_scalar());
    kg.push(
        gate("RX", 1, 1),
        vec![x.into(), wire(0)],
        vec![AbstractValue::operator()],
    );
    let obs = kg.push(named_obs("PauliZ"), vec![wire(0)], vec![AbstractValue::observable()])[0];
    let ev = kg.push(
        measure(MeasurementKind::Expval),
        vec![obs.into()],
        vec![f64_scalar()],
    )[0];
    kg.outputs = vec![ev.into()];

    let wf = single_call_workflow(
        QnodeCall {
            graph: kg,
            device: DeviceConfig::new("lightning.qubit", 1),
            dynamic_shots: false,
        },
        vec![f64_scalar()],
    );

    let lowered = lower_graph(&wf).unwrap();
    let json = serde_json::to_string(&lowered).unwrap();
    let back: Graph<TargetPrim> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, lowered);
}
