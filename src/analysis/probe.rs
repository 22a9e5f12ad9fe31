use serde::Serialize;
use crate::error::{Result, ViewerError};
pub fn locate(xs: &[f64], ys: &[f64], channel: usize) -> Result<(f64, f64)> {
    match (xs.get(channel), ys.get(channel)) {
        (Some(&x), Some(&y)) => Ok((x, y)),
        _ => Err(ViewerError::IndexOutOfRange {
            index: channel,
            len: xs.len().min(ys.len()),
        }),
    }
}
pub fn locate_many(xs: &[f64], ys: &[f64], channels: &[usize]) -> Result<Vec<(f64, f64)>> {
    channels.iter().map(|&c| locate(xs, ys, c)).collect()
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProbeBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}
/// Contact positions of the probe, one `(x, y)` per channel (µm in practice).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeGeometry {
    x: Vec<f64>,
    y: Vec<f64>,
}
impl ProbeGeometry {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(ViewerError::ChannelMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        Ok(Self { x, y })
    }
    pub fn num_channels(&self) -> usize {
        self.x.len()
    }
    pub fn x(&self) -> &[f64] {
        &self.x
    }
    pub fn y(&self) -> &[f64] {
        &self.y
    }
    pub fn locate(&self, channel: usize) -> Result<(f64, f64)> {
        locate(&self.x, &self.y, channel)
    }
    pub fn locate_many(&self, channels: &[usize]) -> Result<Vec<(f64, f64)>> {
        locate_many(&self.x, &self.y, channels)
    }
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
    /// Extent of all contacts; `None` for a probe without channels.
    pub fn bounds(&self) -> Option<ProbeBounds> {
        let mut contacts = self.iter();
        let (x0, y0) = contacts.next()?;
        let init = ProbeBounds {
            min_x: x0,
            max_x: x0,
            min_y: y0,
            max_y: y0,
        };
        Some(contacts.fold(init, |b, (x, y)| ProbeBounds {
            min_x: b.min_x.min(x),
            max_x: b.max_x.max(x),
            min_y: b.min_y.min(y),
            max_y: b.max_y.max(y),
        }))
    }
}
/// Everything a probe-layout plot needs to highlight one template.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeAnnotation {
    pub location: (f64, f64),
    pub active_locations: Vec<(f64, f64)>,
    pub bounds: Option<ProbeBounds>,
}
