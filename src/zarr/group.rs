use std::sync::Arc;
use std::time::Duration;
use futures::future::try_join_all;
use log::debug;
use ndarray::{ArrayD, IxDyn};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use crate::error::{Result, ViewerError};
use crate::zarr::codec::decompress;
use crate::zarr::metadata::ArrayMetadata;
use crate::zarr::slice::{IndexSpec, SlicePlan};
use crate::zarr::store::ArrayStore;
/// Groups are only ever opened for reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
}
/// Shared transport: the store plus the timeout and fetch concurrency applied to every read.
pub struct StoreClient {
    store: Arc<dyn ArrayStore>,
    timeout: Duration,
    fetch_limit: Semaphore,
}
impl StoreClient {
    pub fn new(store: Arc<dyn ArrayStore>, timeout: Duration, max_concurrent_fetches: usize) -> Self {
        Self {
            store,
            timeout,
            fetch_limit: Semaphore::new(max_concurrent_fetches.max(1)),
        }
    }
    pub fn location(&self) -> String {
        self.store.location()
    }
    pub async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _permit = self
            .fetch_limit
            .acquire()
            .await
            .map_err(|e| ViewerError::fetch(key, e))?;
        debug!("fetching {key}");
        match tokio::time::timeout(self.timeout, self.store.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(ViewerError::Timeout {
                key: key.to_string(),
                seconds: self.timeout.as_secs_f64(),
            }),
        }
    }
}
fn join_key(prefix: &str, name: &str) -> String {
    let name = name.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
/// An opened Zarr group.
#[derive(Clone)]
pub struct DatasetHandle {
    client: Arc<StoreClient>,
    path: String,
}
impl DatasetHandle {
    /// Open the root group; a missing or malformed `.zgroup` is a format error.
    pub async fn open(client: Arc<StoreClient>) -> Result<Self> {
        let handle = Self {
            client,
            path: String::new(),
        };
        match handle.client.fetch(".zgroup").await? {
            Some(bytes) => check_group_metadata(&bytes)?,
            None => {
                return Err(ViewerError::format(format!(
                    "no root group metadata (.zgroup) at {}",
                    handle.client.location()
                )))
            }
        }
        Ok(handle)
    }
    pub async fn open_subdataset(&self, name: &str, mode: AccessMode) -> Result<Self> {
        let AccessMode::ReadOnly = mode;
        let path = join_key(&self.path, name);
        match self.client.fetch(&join_key(&path, ".zgroup")).await? {
            Some(bytes) => check_group_metadata(&bytes)?,
            None => return Err(ViewerError::NotFound(format!("group {path:?}"))),
        }
        Ok(Self {
            client: self.client.clone(),
            path,
        })
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    /// Group attributes; an absent `.zattrs` is an empty map.
    pub async fn attributes(&self) -> Result<Map<String, Value>> {
        let key = join_key(&self.path, ".zattrs");
        let Some(bytes) = self.client.fetch(&key).await? else {
            return Ok(Map::new());
        };
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(ViewerError::format(format!("{key} is not a JSON object"))),
        }
    }
    pub async fn array(&self, name: &str) -> Result<ArrayHandle> {
        let path = join_key(&self.path, name);
        let Some(bytes) = self.client.fetch(&join_key(&path, ".zarray")).await? else {
            return Err(ViewerError::NotFound(format!("array {path:?}")));
        };
        let meta = ArrayMetadata::from_json(&bytes)
            .map_err(|e| ViewerError::format(format!("{path}/.zarray: {e}")))?;
        Ok(ArrayHandle {
            client: self.client.clone(),
            path,
            meta: Arc::new(meta),
        })
    }
}
fn check_group_metadata(bytes: &[u8]) -> Result<()> {
    let doc: Value = serde_json::from_slice(bytes)?;
    match doc.get("zarr_format").and_then(Value::as_u64) {
        Some(2) => Ok(()),
        Some(other) => Err(ViewerError::format(format!(
            "zarr_format {other} is not supported"
        ))),
        None => Err(ViewerError::format("group metadata has no zarr_format")),
    }
}
/// An opened Zarr array; chunks are fetched lazily per read.
#[derive(Clone)]
pub struct ArrayHandle {
    client: Arc<StoreClient>,
    path: String,
    meta: Arc<ArrayMetadata>,
}
impl ArrayHandle {
    pub fn shape(&self) -> &[usize] {
        &self.meta.shape
    }
    pub fn metadata(&self) -> &ArrayMetadata {
        &self.meta
    }
    /// Read the selection, fetching only the chunks it touches. Any chunk
    /// failure fails the whole read.
    pub async fn read_slice(&self, spec: &[IndexSpec]) -> Result<ArrayD<f64>> {
        let plan = SlicePlan::new(&self.meta, spec)?;
        let coords = plan.chunk_coords();
        let keys: Vec<String> = coords
            .iter()
            .map(|c| join_key(&self.path, &self.meta.chunk_key(c)))
            .collect();
        debug!("{}: reading {} chunk(s) for {:?}", self.path, keys.len(), spec);
        let raw_chunks = try_join_all(keys.iter().map(|key| async move {
            self.client.fetch(key).await.map_err(|e| match e {
                ViewerError::Connection(reason) => ViewerError::fetch(key, reason),
                other => other,
            })
        }))
        .await?;
        let mut out = vec![self.meta.fill_value; plan.output_len()];
        let expected = self.meta.chunk_len() * self.meta.dtype.size;
        for ((coord, key), raw) in coords.iter().zip(&keys).zip(raw_chunks) {
            // Absent chunks keep the fill value.
            let Some(raw) = raw else { continue };
            let bytes = decompress(self.meta.compressor, raw, expected)
                .map_err(|e| ViewerError::format(format!("{key}: {e}")))?;
            let values = self.meta.dtype.decode(&bytes)?;
            plan.scatter_chunk(coord, &values, &mut out);
        }
        ArrayD::from_shape_vec(IxDyn(&plan.output_shape()), out)
            .map_err(|e| ViewerError::format(format!("{}: {e}", self.path)))
    }
}
