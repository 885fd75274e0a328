use std::sync::Arc;

use forge_layers::{
    Dtype, Layer, LinearLayer, RmsNormLayer, ThetaError, TokenEmbedding, forward_all,
    testing::{Expr, RecordingOps},
};
use forge_loader::gguf::{GGUFDataType, GGUFLoadOptions, GGUFWriter, load_gguf_bytes};
use forge_sdk::Dataset;

const HIDDEN: u64 = 32;
const VOCAB: u64 = 4;

fn tiny_model() -> Dataset {
    let mut writer = GGUFWriter::new();
    writer.add_field("general.architecture", "llama");
    writer
        .add_tensor("token_embd.weight", vec![HIDDEN, VOCAB], GGUFDataType::Q8_0, vec![0; 4 * 34])
        .unwrap()
        .add_tensor("blk.0.attn_norm.weight", vec![HIDDEN], GGUFDataType::F32, vec![0; 4 * 32])
        .unwrap()
        .add_tensor("blk.0.ffn_up.weight", vec![HIDDEN, 8], GGUFDataType::F16, vec![0; 2 * 32 * 8])
        .unwrap()
        .add_tensor("output.weight", vec![8, VOCAB], GGUFDataType::F32, vec![0; 4 * 8 * 4])
        .unwrap();
    load_gguf_bytes(&writer.to_bytes().unwrap(), &GGUFLoadOptions::default()).unwrap()
}

#[test]
fn layer_graph_wires_loaded_parameters_to_operators() {
    let dataset = tiny_model();
    let theta = &dataset.root_theta;
    let ops = Arc::new(RecordingOps::new());

    let embed = TokenEmbedding::new(theta.scope("token_embd").unwrap(), Arc::clone(&ops)).unwrap();
    let norm = RmsNormLayer::new(theta.scope("blk.0.attn_norm").unwrap(), Arc::clone(&ops)).unwrap();
    let up = LinearLayer::new(theta.scope("blk.0.ffn_up").unwrap(), Arc::clone(&ops)).unwrap();
    let head = LinearLayer::new(theta.scope("output").unwrap(), Arc::clone(&ops)).unwrap();

    assert_eq!(embed.weight().shape(), &[4, 32]);
    assert_eq!(up.weight().shape(), &[8, 32]);

    let layers: [&dyn Layer<RecordingOps>; 4] = [&embed, &norm, &up, &head];
    let out = forward_all(&layers, &Expr::input("tokens")).unwrap();
    assert_eq!(
        out.to_string(),
        "matmul(matmul(rms_norm(embedding(tokens, token_embd.weight, F32), blk.0.attn_norm.weight, eps=1e-6), blk.0.ffn_up.weight^T), output.weight^T)"
    );

    let calls = ops.calls();
    let summary: Vec<_> = calls.iter().map(|call| (call.op, call.weight_dtype)).collect();
    assert_eq!(
        summary,
        vec![
            ("embedding_lookup", Dtype::Q8_0),
            ("rms_norm", Dtype::F32),
            ("matmul", Dtype::F16),
            ("matmul", Dtype::F32),
        ]
    );
}

#[test]
fn missing_parameters_fail_before_anything_runs() {
    let dataset = tiny_model();
    let ops = Arc::new(RecordingOps::new());

    let err = dataset.root_theta.scope("blk.1").unwrap_err();
    assert_eq!(err, ThetaError::NotFound("blk.1".into()));

    let block = dataset.root_theta.scope("blk.0").unwrap();
    let err = RmsNormLayer::new(block, Arc::clone(&ops)).unwrap_err();
    assert_eq!(err, ThetaError::NotFound("weight".into()));
    assert!(ops.calls().is_empty());
}

#[test]
fn operator_failure_stops_the_graph() {
    let dataset = tiny_model();
    let ops = Arc::new(RecordingOps::rejecting("matmul"));
    let norm = RmsNormLayer::new(dataset.root_theta.scope("blk.0.attn_norm").unwrap(), Arc::clone(&ops)).unwrap();
    let up = LinearLayer::new(dataset.root_theta.scope("blk.0.ffn_up").unwrap(), Arc::clone(&ops)).unwrap();

    let layers: [&dyn Layer<RecordingOps>; 2] = [&norm, &up];
    assert!(forward_all(&layers, &Expr::input("h")).is_err());
    assert_eq!(ops.calls().len(), 1);
}
