use ndarray::ArrayView2;
#[derive(Clone, Copy, Debug)]
struct Extent {
    min: f64,
    max: f64,
}
/// Peak-to-peak amplitude per channel of a `[samples, channels]` template.
///
/// One pass over the samples tracks a running min/max per column. A template
/// with no samples yields zero for every channel.
pub fn compute_amplitudes(template: ArrayView2<'_, f64>) -> Vec<f64> {
    let mut extents: Vec<Option<Extent>> = vec![None; template.ncols()];
    for sample in template.rows() {
        for (extent, &value) in extents.iter_mut().zip(sample.iter()) {
            match extent {
                None => *extent = Some(Extent { min: value, max: value }),
                Some(e) => {
                    if value < e.min {
                        e.min = value;
                    }
                    if value > e.max {
                        e.max = value;
                    }
                }
            }
        }
    }
    extents
        .into_iter()
        .map(|e| e.map(|e| e.max - e.min).unwrap_or(0.0))
        .collect()
}
/// Population standard deviation; zero for an empty waveform.
pub fn std_dev(waveform: &[f64]) -> f64 {
    if waveform.is_empty() {
        return 0.0;
    }
    let n = waveform.len() as f64;
    let mean = waveform.iter().sum::<f64>() / n;
    let variance = waveform
        .iter()
        .map(|v| {
            let delta = v - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}
