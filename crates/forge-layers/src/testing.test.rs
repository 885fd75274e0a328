#![cfg(test)]

use forge_sdk::PrimitiveTensor;

use super::*;

fn weight(name: &str) -> InferenceTensor {
    PrimitiveTensor::from_values(name, vec![1], &[1.0f32]).unwrap().into()
}

#[test]
fn calls_are_recorded_in_order_and_can_be_drained() {
    let ops = RecordingOps::new();
    let x = Expr::input("x");
    let h = ops.rms_norm(&x, &weight("norm"), 1e-6).unwrap();
    ops.matmul(&h, &weight("proj"), true).unwrap();

    let names: Vec<_> = ops.calls().into_iter().map(|call| (call.op, call.weight)).collect();
    assert_eq!(names, vec![("rms_norm", "norm".to_string()), ("matmul", "proj".to_string())]);
    assert_eq!(ops.take_calls().len(), 2);
    assert!(ops.calls().is_empty());
}

#[test]
fn rejected_ops_fail_without_recording() {
    let ops = RecordingOps::rejecting("matmul");
    let err = ops.matmul(&Expr::input("x"), &weight("proj"), false).unwrap_err();
    assert!(err.to_string().contains("proj"), "{err}");
    assert!(ops.calls().is_empty());
    assert!(ops.embedding_lookup(&Expr::input("ids"), &weight("embd"), Dtype::F32).is_ok());
}

#[test]
fn expressions_render_nested_calls() {
    let expr = Expr::MatMul {
        input: Box::new(Expr::RmsNorm {
            input: Box::new(Expr::input("x")),
            weight: "n".into(),
            epsilon: 1e-6,
        }),
        weight: "w".into(),
        transpose_rhs: false,
    };
    assert_eq!(expr.to_string(), "matmul(rms_norm(x, n, eps=1e-6), w)");
}
