use std::thread;

use forge_sdk::{Dataset, InferenceTensor, PrimitiveTensor, QuantizedTensor, TensorBuffer, Theta};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn loaded_values_cross_threads() {
    assert_send_sync::<TensorBuffer>();
    assert_send_sync::<PrimitiveTensor>();
    assert_send_sync::<QuantizedTensor>();
    assert_send_sync::<InferenceTensor>();
    assert_send_sync::<Theta>();
    assert_send_sync::<Dataset>();
}

#[test]
fn theta_clones_share_tensors_across_threads() {
    let weight = PrimitiveTensor::from_values("weight", vec![2, 2], &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let theta = Theta::new([InferenceTensor::from(weight)]).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let theta = theta.clone();
            thread::spawn(move || theta.tensor("weight").unwrap().to_f32_vec().unwrap().iter().sum::<f32>())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 10.0);
    }
    assert!(
        theta.tensor("weight").unwrap().buffer().shares_storage_with(
            theta.clone().tensor("weight").unwrap().buffer()
        )
    );
}
