use serde::Serialize;
use crate::error::{Result, ViewerError};
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    pub best_channel: usize,
    /// Ascending, never contains `best_channel`.
    pub active_channels: Vec<usize>,
}
/// Picks the best channel and the channels within `threshold_ratio` of it.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSelector {
    threshold_ratio: f64,
}
impl ChannelSelector {
    pub fn new(threshold_ratio: f64) -> Self {
        Self { threshold_ratio }
    }
    pub fn threshold_ratio(&self) -> f64 {
        self.threshold_ratio
    }
    pub fn select(&self, amplitudes: &[f64]) -> Result<SelectionResult> {
        select(amplitudes, self.threshold_ratio)
    }
}
/// First index holding the maximum; NaN never wins.
fn first_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}
pub fn select(amplitudes: &[f64], threshold_ratio: f64) -> Result<SelectionResult> {
    if amplitudes.is_empty() {
        return Err(ViewerError::InvalidInput(
            "cannot select a best channel from zero channels".into(),
        ));
    }
    let best_channel = first_argmax(amplitudes).unwrap_or(0);
    let threshold = amplitudes[best_channel] * threshold_ratio;
    let active_channels = amplitudes
        .iter()
        .enumerate()
        .filter(|&(i, &a)| i != best_channel && a >= threshold)
        .map(|(i, _)| i)
        .collect();
    Ok(SelectionResult {
        best_channel,
        active_channels,
    })
}
