use std::sync::Arc;
use log::{debug, info};
use ndarray::{Array2, Ix2};
use tokio::sync::OnceCell;
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::analysis::probe::ProbeGeometry;
use crate::zarr::{
    AccessMode, ArrayHandle, ArrayStore, DatasetHandle, HttpStore, IndexSpec, StoreClient,
};
/// Session-wide handles to one template database.
///
/// Every handle is opened at most once and then shared read-only by all
/// pipelines. Concurrent first callers wait on the same initialisation; a
/// failed or abandoned initialisation leaves the slot empty for the next caller.
pub struct TemplateSession {
    client: Arc<StoreClient>,
    config: ViewerConfig,
    root: OnceCell<DatasetHandle>,
    probe: OnceCell<DatasetHandle>,
    templates: OnceCell<ArrayHandle>,
    sampling_frequency: OnceCell<f64>,
    geometry: OnceCell<Arc<ProbeGeometry>>,
}
impl TemplateSession {
    pub fn new(store: Arc<dyn ArrayStore>, config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(StoreClient::new(
            store,
            config.fetch_timeout(),
            config.max_concurrent_fetches,
        ));
        Ok(Self {
            client,
            config,
            root: OnceCell::new(),
            probe: OnceCell::new(),
            templates: OnceCell::new(),
            sampling_frequency: OnceCell::new(),
            geometry: OnceCell::new(),
        })
    }
    /// Session over HTTP(S) at `config.base_url`.
    pub fn http(config: ViewerConfig) -> Result<Self> {
        let store = HttpStore::new(&config.base_url, config.fetch_timeout())?;
        Self::new(Arc::new(store), config)
    }
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
    pub async fn root(&self) -> Result<&DatasetHandle> {
        self.root
            .get_or_try_init(|| async {
                info!("opening template dataset at {}", self.client.location());
                DatasetHandle::open(self.client.clone()).await
            })
            .await
    }
    pub async fn probe(&self) -> Result<&DatasetHandle> {
        self.probe
            .get_or_try_init(|| async {
                self.root()
                    .await?
                    .open_subdataset(&self.config.probe_group, AccessMode::ReadOnly)
                    .await
            })
            .await
    }
    pub async fn templates(&self) -> Result<&ArrayHandle> {
        self.templates
            .get_or_try_init(|| async {
                let array = self.root().await?.array(&self.config.templates_array).await?;
                if array.shape().len() != 3 {
                    return Err(ViewerError::format(format!(
                        "{} must be 3D (template, sample, channel), found shape {:?}",
                        self.config.templates_array,
                        array.shape()
                    )));
                }
                debug!("template array shape {:?}", array.shape());
                Ok(array)
            })
            .await
    }
    pub async fn num_templates(&self) -> Result<usize> {
        Ok(self.templates().await?.shape()[0])
    }
    pub async fn sampling_frequency(&self) -> Result<f64> {
        self.sampling_frequency
            .get_or_try_init(|| async {
                let attrs = self.root().await?.attributes().await?;
                match attrs.get("sampling_frequency").and_then(|v| v.as_f64()) {
                    Some(fs) if fs.is_finite() && fs > 0.0 => Ok(fs),
                    Some(fs) => Err(ViewerError::format(format!(
                        "sampling_frequency must be positive, got {fs}"
                    ))),
                    None => Err(ViewerError::format(
                        "root attributes have no numeric sampling_frequency",
                    )),
                }
            })
            .await
            .copied()
    }
    /// Probe contact coordinates, fetched once per session.
    pub async fn geometry(&self) -> Result<Arc<ProbeGeometry>> {
        self.geometry
            .get_or_try_init(|| async {
                let probe = self.probe().await?;
                let (x, y) = futures::try_join!(
                    read_vector(probe, &self.config.probe_x),
                    read_vector(probe, &self.config.probe_y)
                )?;
                let geometry = ProbeGeometry::new(x, y)?;
                info!("probe has {} channels", geometry.num_channels());
                Ok(Arc::new(geometry))
            })
            .await
            .cloned()
    }
    /// The `[samples, channels]` matrix of one template.
    pub async fn template_slice(&self, template_index: usize) -> Result<Array2<f64>> {
        let slice = self
            .templates()
            .await?
            .read_slice(&[IndexSpec::Index(template_index), IndexSpec::All, IndexSpec::All])
            .await?;
        slice
            .into_dimensionality::<Ix2>()
            .map_err(|e| ViewerError::format(format!("template slice: {e}")))
    }
}
async fn read_vector(group: &DatasetHandle, name: &str) -> Result<Vec<f64>> {
    let array = group.array(name).await?;
    if array.shape().len() != 1 {
        return Err(ViewerError::format(format!(
            "probe array {name} must be 1D, found shape {:?}",
            array.shape()
        )));
    }
    Ok(array.read_slice(&[IndexSpec::All]).await?.into_iter().collect())
}
