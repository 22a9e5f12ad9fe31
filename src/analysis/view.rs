use std::collections::BTreeMap;
use std::sync::Arc;
use serde::Serialize;
use crate::analysis::probe::ProbeAnnotation;
use crate::error::ErrorKind;
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub attribute: String,
    pub value: String,
}
impl TableRow {
    pub fn new(attribute: &str, value: impl ToString) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}
/// Ready-to-plot result for one template index. Never mutated once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewModel {
    pub template_index: usize,
    pub sampling_frequency: f64,
    pub num_samples: usize,
    pub num_channels: usize,
    pub time_axis_ms: Vec<f64>,
    pub amplitudes: Vec<f64>,
    pub best_channel: usize,
    pub best_channel_series: Vec<f64>,
    pub active_channels: Vec<usize>,
    pub active_channel_series: BTreeMap<usize, Vec<f64>>,
    pub location: (f64, f64),
    pub probe: ProbeAnnotation,
    pub table: Vec<TableRow>,
}
impl ViewModel {
    pub fn best_amplitude(&self) -> f64 {
        self.amplitudes
            .get(self.best_channel)
            .copied()
            .unwrap_or(0.0)
    }
    pub fn summary_line(&self) -> String {
        format!(
            "template {}: best channel {} (ptp {:.2}) at ({:.1}, {:.1}), {} active channel(s), {} samples @ {} Hz",
            self.template_index,
            self.best_channel,
            self.best_amplitude(),
            self.location.0,
            self.location.1,
            self.active_channels.len(),
            self.num_samples,
            self.sampling_frequency
        )
    }
}
/// Pipeline progress for one template index.
#[derive(Clone, Debug)]
pub enum ViewState {
    Fetching,
    Computing,
    Ready(Arc<ViewModel>),
    Failed { kind: ErrorKind, message: String },
}
impl ViewState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewState::Ready(_) | ViewState::Failed { .. })
    }
}
#[derive(Clone, Debug)]
pub struct ViewEvent {
    pub template_index: usize,
    pub state: ViewState,
}
