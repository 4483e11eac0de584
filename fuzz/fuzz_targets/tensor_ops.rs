#![no_main]

use arbitrary::Arbitrary;
use cognera::autograd::{Graph, Tensor};
use libfuzzer_sys::fuzz_target;

/// Fuzz target for graph operations
///
/// Operations on arbitrary shapes must either succeed or return an error,
/// never panic, and a backward pass must always leave the tape empty.

#[derive(Arbitrary, Debug)]
struct GraphFuzzInput {
    rows_a: u8,
    cols_a: u8,
    rows_b: u8,
    cols_b: u8,
    values: Vec<u8>,
    ops: Vec<u8>,
    seed_len_delta: u8,
}

fn bytes_to_f32(bytes: &[u8], size: usize) -> Vec<f32> {
    // Map 0..255 to -10.0..10.0, cycling when bytes run short
    (0..size)
        .map(|i| {
            let b = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            ((b as f32) / 255.0) * 20.0 - 10.0
        })
        .collect()
}

fuzz_target!(|input: GraphFuzzInput| {
    let dim = |d: u8| (d as usize % 8) + 1;
    let (ra, ca, rb, cb) = (
        dim(input.rows_a),
        dim(input.cols_a),
        dim(input.rows_b),
        dim(input.cols_b),
    );

    let mut graph = Graph::begin();
    let a = graph.leaf(Tensor::new(bytes_to_f32(&input.values, ra * ca), (ra, ca)).unwrap());
    let b = graph.leaf(Tensor::new(bytes_to_f32(&input.values, rb * cb), (rb, cb)).unwrap());

    let mut last = a;
    for op in input.ops.iter().take(16) {
        let before = graph.tape_len();
        let result = match op % 4 {
            0 => graph.add(last, b),
            1 => graph.mul(last, b),
            2 => graph.matmul(last, b),
            _ => graph.relu(last),
        };
        match result {
            Ok(id) => {
                // Invariant: every success records exactly one result
                assert_eq!(graph.tape_len(), before + 1);
                last = id;
            }
            Err(_) => assert_eq!(graph.tape_len(), before),
        }
    }

    let len = graph.tensor(last).unwrap().len();
    let seed_len = len + (input.seed_len_delta % 2) as usize;
    let seed = ndarray::Array1::ones(seed_len);
    match graph.backward(last, Some(seed)) {
        Ok(_) => assert_eq!(graph.tape_len(), 0),
        Err(_) => assert_ne!(seed_len, len),
    }
});
