use statrs::statistics::Statistics;

/// Flag values whose absolute z-score is at least `threshold`.
///
/// Mean and population standard deviation are taken over the present values
/// only. Absent values are never flagged, and a zero-variance series flags
/// nothing.
pub fn threshold_flags(series: &[Option<f64>], threshold: f64) -> Vec<bool> {
    let present: Vec<f64> = series.iter().flatten().copied().collect();
    if present.is_empty() {
        return vec![false; series.len()];
    }
    let mean = present.iter().mean();
    let sd = present.iter().population_std_dev();
    if !sd.is_finite() || sd == 0.0 {
        return vec![false; series.len()];
    }

    series
        .iter()
        .map(|v| match v {
            Some(x) if x.is_finite() => ((x - mean) / sd).abs() >= threshold,
            _ => false,
        })
        .collect()
}
