//! Math utility functions

/// Numerically stable softmax
pub fn softmax(x: &[f32]) -> Vec<f32> {
    if x.is_empty() {
        return Vec::new();
    }

    let max_val = x.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Vec<f32> = x.iter().map(|v| (v - max_val).exp()).collect();
    let sum: f32 = exp_vals.iter().sum();
    exp_vals.iter().map(|v| v / sum).collect()
}

/// Index and value of the largest element. NaN entries never win.
pub fn argmax(x: &[f32]) -> Option<(usize, f32)> {
    x.iter()
        .cloned()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (idx, v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((idx, v)),
        })
}

/// True when every value is in [0, 1] and the values sum to 1 (within `tolerance`)
pub fn is_probability_distribution(x: &[f32], tolerance: f32) -> bool {
    if x.is_empty() {
        return false;
    }

    let in_range = x.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = x.iter().sum();
    in_range && (sum - 1.0).abs() <= tolerance
}


