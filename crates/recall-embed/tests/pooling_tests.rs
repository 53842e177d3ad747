use candle_core::{DType, Device, Tensor};
use recall_embed::masked_mean_l2;

fn pooled(states: &[f32], mask: &[f32], shape: (usize, usize, usize)) -> Vec<Vec<f32>> {
    let dev = Device::Cpu;
    let hidden = Tensor::from_slice(states, shape, &dev).expect("states");
    let mask = Tensor::from_slice(mask, (shape.0, shape.1), &dev).expect("mask");
    masked_mean_l2(&hidden, &mask).expect("pool").to_vec2().expect("rows")
}

#[test]
fn padding_tokens_do_not_move_the_sentence_vector() {
    // Row 0: two real tokens. Row 1: one real token followed by padding.
    let rows = pooled(
        &[3.0, 0.0, 0.0, 4.0, /* row 1 */ 0.0, 2.0, 9.0, 9.0],
        &[1.0, 1.0, /* row 1 */ 1.0, 0.0],
        (2, 2, 2),
    );
    assert!((rows[0][0] - 0.6).abs() < 1e-5 && (rows[0][1] - 0.8).abs() < 1e-5);
    assert!(rows[1][0].abs() < 1e-6 && (rows[1][1] - 1.0).abs() < 1e-6);
}

#[test]
fn all_padding_row_is_zero_not_nan() {
    let rows = pooled(&[1.0, 1.0, 2.0, 2.0], &[0.0, 0.0], (1, 2, 2));
    assert!(rows[0].iter().all(|x| x.is_finite() && x.abs() < 1e-6));
}

#[test]
fn rank_two_states_are_rejected() {
    let dev = Device::Cpu;
    let hidden = Tensor::zeros((2, 4), DType::F32, &dev).expect("zeros");
    let mask = Tensor::ones((2, 4), DType::F32, &dev).expect("ones");
    assert!(masked_mean_l2(&hidden, &mask).is_err());
}
