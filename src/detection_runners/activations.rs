/// Logistic function `e^v / (1 + e^v)`, evaluated so that neither branch overflows.
#[inline]
pub fn sigmoid(v: f32) -> f32 {
    if v >= 0. {
        1. / (1. + (-v).exp())
    } else {
        let k = v.exp();
        k / (1. + k)
    }
}

/// Max-subtracted softmax. Empty input gives an empty output.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}

/// Index and value of the largest element; ties go to the first index.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }
    best
}
