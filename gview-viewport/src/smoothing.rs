//! Shared box-blur smoothing used by the sampled-coverage engine and the
//! bin-level coverage cache.

/// Runs `passes` rounds of a radius-`radius` moving average over `values`.
pub fn box_blur(values: &[f64], radius: usize, passes: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..passes {
        out = moving_average(&out, radius);
    }
    out
}

fn moving_average(values: &[f64], radius: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n - 1);
            let window = &values[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_flattens_spike() {
        let values = vec![0.0, 0.0, 10.0, 0.0, 0.0];
        let smoothed = moving_average(&values, 1);
        assert!(smoothed[2] < 10.0);
        assert!(smoothed[2] > 0.0);
    }

    #[test]
    fn test_box_blur_empty() {
        assert!(box_blur(&[], 2, 3).is_empty());
    }
}
