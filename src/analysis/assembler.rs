use std::collections::BTreeMap;
use std::sync::Arc;
use futures::future::join_all;
use log::{debug, warn};
use ndarray::Array2;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use crate::analysis::amplitude::{compute_amplitudes, std_dev};
use crate::analysis::probe::{ProbeAnnotation, ProbeGeometry};
use crate::analysis::selection::ChannelSelector;
use crate::analysis::session::TemplateSession;
use crate::analysis::view::{TableRow, ViewEvent, ViewModel, ViewState};
use crate::error::{Result, ViewerError};
/// Everything the Fetching phase gathers for one template.
#[derive(Clone, Debug)]
pub struct FetchedTemplate {
    pub template_index: usize,
    pub sampling_frequency: f64,
    pub geometry: Arc<ProbeGeometry>,
    pub slice: Array2<f64>, // samples x channels
}
/// Builds view models for template indices against one shared session.
#[derive(Clone)]
pub struct TemplateViewer {
    session: Arc<TemplateSession>,
    selector: ChannelSelector,
}
impl TemplateViewer {
    pub fn new(session: Arc<TemplateSession>) -> Self {
        let selector = ChannelSelector::new(session.config().threshold_ratio);
        Self { session, selector }
    }
    pub fn session(&self) -> &Arc<TemplateSession> {
        &self.session
    }
    pub async fn fetch(&self, template_index: usize) -> Result<FetchedTemplate> {
        let (sampling_frequency, geometry, slice) = futures::try_join!(
            self.session.sampling_frequency(),
            self.session.geometry(),
            self.session.template_slice(template_index)
        )?;
        Ok(FetchedTemplate {
            template_index,
            sampling_frequency,
            geometry,
            slice,
        })
    }
    pub fn compute(&self, fetched: &FetchedTemplate) -> Result<ViewModel> {
        let FetchedTemplate {
            template_index,
            sampling_frequency,
            geometry,
            slice,
        } = fetched;
        let (num_samples, num_channels) = slice.dim();
        if num_channels != geometry.num_channels() {
            return Err(ViewerError::ChannelMismatch {
                expected: geometry.num_channels(),
                actual: num_channels,
            });
        }
        let amplitudes = compute_amplitudes(slice.view());
        let selection = self.selector.select(&amplitudes)?;
        let location = geometry.locate(selection.best_channel)?;
        let active_locations = geometry.locate_many(&selection.active_channels)?;
        let time_axis_ms: Vec<f64> = (0..num_samples)
            .map(|i| i as f64 / sampling_frequency * 1000.0)
            .collect();
        let best_channel_series = slice.column(selection.best_channel).to_vec();
        let active_channel_series: BTreeMap<usize, Vec<f64>> = selection
            .active_channels
            .iter()
            .map(|&c| (c, slice.column(c).to_vec()))
            .collect();
        let table = vec![
            TableRow::new("Number of Samples", num_samples),
            TableRow::new("Number of Channels", num_channels),
            TableRow::new("Best Channel", selection.best_channel),
            TableRow::new(
                "Peak-to-Peak",
                format!("{:.2}", amplitudes[selection.best_channel]),
            ),
            TableRow::new("STD", format!("{:.2}", std_dev(&best_channel_series))),
            TableRow::new("Active Channels", selection.active_channels.len()),
            TableRow::new("Sampling Frequency (Hz)", sampling_frequency),
            TableRow::new(
                "Location (um)",
                format!("({:.1}, {:.1})", location.0, location.1),
            ),
        ];
        Ok(ViewModel {
            template_index: *template_index,
            sampling_frequency: *sampling_frequency,
            num_samples,
            num_channels,
            time_axis_ms,
            amplitudes,
            best_channel: selection.best_channel,
            best_channel_series,
            active_channels: selection.active_channels,
            active_channel_series,
            location,
            probe: ProbeAnnotation {
                location,
                active_locations,
                bounds: geometry.bounds(),
            },
            table,
        })
    }
    /// Run Fetching then Computing for one index.
    pub async fn assemble(&self, template_index: usize) -> Result<ViewModel> {
        let fetched = self.fetch(template_index).await?;
        self.compute(&fetched)
    }
    /// Assemble several indices concurrently; one failure never affects the others.
    pub async fn assemble_many(&self, indices: &[usize]) -> Vec<(usize, Result<Arc<ViewModel>>)> {
        join_all(indices.iter().map(|&index| async move {
            let result = self.assemble(index).await.map(Arc::new);
            (index, result)
        }))
        .await
    }
    /// Drive one index through its states on the runtime, reporting each
    /// transition on `events`. Events for a dropped receiver are discarded.
    pub fn spawn(&self, template_index: usize, events: UnboundedSender<ViewEvent>) -> ViewTask {
        let viewer = self.clone();
        let handle = tokio::spawn(async move {
            let emit = |state: ViewState| {
                events
                    .send(ViewEvent {
                        template_index,
                        state: state.clone(),
                    })
                    .ok();
                state
            };
            emit(ViewState::Fetching);
            let outcome = match viewer.fetch(template_index).await {
                Ok(fetched) => {
                    emit(ViewState::Computing);
                    viewer.compute(&fetched)
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(view) => {
                    debug!("template {template_index} ready");
                    emit(ViewState::Ready(Arc::new(view)))
                }
                Err(e) => {
                    warn!("template {template_index} failed: {e}");
                    emit(ViewState::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                }
            }
        });
        ViewTask {
            template_index,
            handle,
        }
    }
}
/// Handle to a spawned pipeline.
pub struct ViewTask {
    template_index: usize,
    handle: JoinHandle<ViewState>,
}
impl ViewTask {
    pub fn template_index(&self) -> usize {
        self.template_index
    }
    /// Abandon in-flight reads; the pipeline emits nothing further.
    pub fn cancel(&self) {
        self.handle.abort();
    }
    /// Final state, or `None` when the pipeline was cancelled.
    pub async fn join(self) -> Option<ViewState> {
        self.handle.await.ok()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testutil::{slow, viewer_over, ChunkCodec, TemplateFixture};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    #[tokio::test]
    async fn builds_a_complete_view_model() {
        let fixture = TemplateFixture::synthetic(12, 60, 16);
        let (_, viewer) = viewer_over(fixture.to_store());
        let view = viewer.assemble(5).await.unwrap();
        assert_eq!(view.template_index, 5);
        assert_eq!(view.best_channel, 5);
        assert_eq!(view.active_channels, vec![3, 4, 6, 7]);
        assert_eq!(view.location, (32.0, 40.0));
        assert_eq!(view.probe.active_locations[0], (32.0, 20.0));
        assert_eq!(view.time_axis_ms.len(), 60);
        assert!((view.time_axis_ms[30] - 1.0).abs() < 1e-12);
        let expected: Vec<f64> = fixture
            .templates
            .slice(ndarray::s![5, .., 5])
            .iter()
            .map(|&v| v as f64)
            .collect();
        assert_eq!(view.best_channel_series, expected);
        assert_eq!(
            view.active_channel_series.keys().copied().collect::<Vec<_>>(),
            view.active_channels
        );
        assert_eq!(view.table[0], TableRow::new("Number of Samples", 60));
        assert_eq!(view.sampling_frequency, 30_000.0);
    }
    #[tokio::test]
    async fn blosc_chunks_decode_to_the_same_view() {
        let fixture = TemplateFixture::synthetic(4, 48, 8);
        let (_, raw) = viewer_over(fixture.to_store());
        let blosc_fixture = TemplateFixture::synthetic(4, 48, 8).with_codec(ChunkCodec::Blosc);
        let (_, blosc) = viewer_over(blosc_fixture.to_store());
        assert_eq!(raw.assemble(3).await.unwrap(), blosc.assemble(3).await.unwrap());
    }
    #[tokio::test]
    async fn repeated_runs_are_identical_and_reuse_handles() {
        let (store, viewer) = viewer_over(TemplateFixture::synthetic(8, 32, 6).to_store());
        let first = viewer.assemble(2).await.unwrap();
        let second = viewer.assemble(2).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.request_count(".zgroup"), 1);
        assert_eq!(store.request_count(".zattrs"), 1);
        assert_eq!(store.request_count("probe/x/0"), 1);
        assert_eq!(store.request_count("templates_array/.zarray"), 1);
        assert_eq!(store.request_count("templates_array/2.0.0"), 2);
        assert_eq!(store.request_count("templates_array/3.0.0"), 0);
    }
    #[tokio::test]
    async fn concurrent_indices_do_not_cross_contaminate() {
        let fixture = TemplateFixture::synthetic(16, 40, 12);
        let (store, viewer) = viewer_over(slow(fixture.to_store()));
        let results = viewer.assemble_many(&[5, 10]).await;
        let five = results[0].1.as_ref().unwrap();
        let ten = results[1].1.as_ref().unwrap();
        assert_eq!((results[0].0, five.best_channel), (5, 5));
        assert_eq!((results[1].0, ten.best_channel), (10, 10));
        assert_eq!(five.active_channels, vec![3, 4, 6, 7]);
        assert_eq!(ten.active_channels, vec![8, 9, 11]);
        // Shared handles were opened once despite the concurrent start.
        assert_eq!(store.request_count(".zgroup"), 1);
        assert_eq!(store.request_count("probe/y/0"), 1);
    }
    #[tokio::test]
    async fn a_failing_index_leaves_siblings_intact() {
        let mut store = TemplateFixture::synthetic(6, 20, 4).to_store();
        store.fail_key("templates_array/1.0.0");
        let (_, viewer) = viewer_over(store);
        let results = viewer.assemble_many(&[0, 1, 9]).await;
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].1.as_ref().unwrap_err().kind(), ErrorKind::Fetch);
        assert_eq!(
            results[2].1.as_ref().unwrap_err().kind(),
            ErrorKind::IndexOutOfRange
        );
    }
    #[tokio::test]
    async fn empty_template_uses_the_zero_amplitude_rule() {
        let (_, viewer) = viewer_over(TemplateFixture::synthetic(3, 0, 4).to_store());
        let view = viewer.assemble(1).await.unwrap();
        assert_eq!(view.amplitudes, vec![0.0; 4]);
        assert_eq!(view.best_channel, 0);
        assert_eq!(view.active_channels, vec![1, 2, 3]);
        assert!(view.time_axis_ms.is_empty());
        assert!(view.best_channel_series.is_empty());
    }
    #[tokio::test]
    async fn metadata_problems_are_reported_by_kind() {
        let mut store = TemplateFixture::synthetic(2, 10, 4).to_store();
        store.insert_json(".zattrs", &json!({"sampling_frequency": -1}));
        let (_, viewer) = viewer_over(store);
        assert_eq!(viewer.assemble(0).await.unwrap_err().kind(), ErrorKind::Format);
        let mut store = TemplateFixture::synthetic(2, 10, 4).to_store();
        store.remove("probe/.zgroup");
        let (_, viewer) = viewer_over(store);
        assert_eq!(viewer.assemble(0).await.unwrap_err().kind(), ErrorKind::NotFound);
        let mut fixture = TemplateFixture::synthetic(2, 10, 4);
        fixture.x.pop();
        fixture.y.pop();
        let (_, viewer) = viewer_over(fixture.to_store());
        assert_eq!(viewer.assemble(0).await.unwrap_err().kind(), ErrorKind::Format);
    }
    #[tokio::test]
    async fn spawned_pipeline_reports_each_state() {
        let (_, viewer) = viewer_over(TemplateFixture::synthetic(4, 16, 4).to_store());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = viewer.spawn(3, tx);
        assert_eq!(task.template_index(), 3);
        let final_state = task.join().await.unwrap();
        assert!(matches!(final_state, ViewState::Ready(ref v) if v.best_channel == 3));
        let mut states = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.template_index, 3);
            states.push(event.state);
        }
        assert!(matches!(states[0], ViewState::Fetching));
        assert!(matches!(states[1], ViewState::Computing));
        assert!(matches!(states[2], ViewState::Ready(_)));
        assert_eq!(states.len(), 3);
    }
    #[tokio::test]
    async fn spawned_failure_records_the_kind() {
        let mut store = TemplateFixture::synthetic(2, 16, 4).to_store();
        store.remove(".zgroup");
        let (_, viewer) = viewer_over(store);
        let (tx, _rx) = mpsc::unbounded_channel();
        let state = viewer.spawn(0, tx).join().await.unwrap();
        assert!(matches!(
            state,
            ViewState::Failed {
                kind: ErrorKind::Format,
                ..
            }
        ));
    }
    #[tokio::test]
    async fn cancelled_pipeline_delivers_nothing() {
        let mut store = TemplateFixture::synthetic(2, 16, 4).to_store();
        store.stall_key("templates_array/1.0.0");
        let (_, viewer) = viewer_over(store);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = viewer.spawn(1, tx);
        match rx.recv().await.map(|e| e.state) {
            Some(ViewState::Fetching) => {}
            other => panic!("expected Fetching first, got {other:?}"),
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        task.cancel();
        assert!(task.join().await.is_none());
        // The aborted task dropped its sender without emitting a terminal state.
        assert!(rx.recv().await.is_none());
        // The session stays usable for other indices.
        assert!(viewer.assemble(0).await.is_ok());
    }
}
