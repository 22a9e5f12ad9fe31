// Builders for in-memory template databases laid out like the public one.
use std::sync::Arc;
use std::time::Duration;
use ndarray::Array3;
use serde_json::{json, Value};
use crate::analysis::{TemplateSession, TemplateViewer};
use crate::config::ViewerConfig;
use crate::zarr::codec::tests::blosc_lz4_frame;
use crate::zarr::MemoryStore;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkCodec {
    Raw,
    Blosc,
}
pub struct TemplateFixture {
    pub templates: Array3<f32>, // template x sample x channel
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub sampling_frequency: f64,
    pub codec: ChunkCodec,
}
impl TemplateFixture {
    /// Every template peaks on channel `t % channels`, falling off with distance.
    pub fn synthetic(num_templates: usize, num_samples: usize, num_channels: usize) -> Self {
        let templates = Array3::from_shape_fn(
            (num_templates, num_samples, num_channels),
            |(t, s, c)| {
                let peak = t % num_channels;
                let distance = (c as isize - peak as isize).unsigned_abs() as f32;
                let gain = 100.0 / (1.0 + 2.0 * distance * distance);
                let phase = s as f32 / num_samples.max(1) as f32 * std::f32::consts::TAU;
                -gain * phase.sin()
            },
        );
        let x = (0..num_channels).map(|c| if c % 2 == 0 { 0.0 } else { 32.0 }).collect();
        let y = (0..num_channels).map(|c| (c / 2) as f64 * 20.0).collect();
        Self {
            templates,
            x,
            y,
            sampling_frequency: 30_000.0,
            codec: ChunkCodec::Raw,
        }
    }
    pub fn with_codec(mut self, codec: ChunkCodec) -> Self {
        self.codec = codec;
        self
    }
    /// One chunk per template, matching how the database is written.
    pub fn to_store(&self) -> MemoryStore {
        let (num_templates, num_samples, num_channels) = self.templates.dim();
        let mut store = MemoryStore::new();
        store.insert_json(".zgroup", &json!({"zarr_format": 2}));
        store.insert_json(
            ".zattrs",
            &json!({"sampling_frequency": self.sampling_frequency}),
        );
        store.insert_json("probe/.zgroup", &json!({"zarr_format": 2}));
        for (name, values) in [("x", &self.x), ("y", &self.y)] {
            store.insert_json(
                format!("probe/{name}/.zarray"),
                &array_meta(&[values.len()], &[values.len().max(1)], "<f8", Value::Null),
            );
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            store.insert(format!("probe/{name}/0"), bytes);
        }
        let compressor = match self.codec {
            ChunkCodec::Raw => Value::Null,
            ChunkCodec::Blosc => {
                json!({"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1, "blocksize": 0})
            }
        };
        store.insert_json(
            "templates_array/.zarray",
            &array_meta(
                &[num_templates, num_samples, num_channels],
                &[1, num_samples.max(1), num_channels.max(1)],
                "<f4",
                compressor,
            ),
        );
        for t in 0..num_templates {
            let mut bytes: Vec<u8> = self
                .templates
                .index_axis(ndarray::Axis(0), t)
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect();
            // Edge-free chunks: pad to the full chunk size when a dimension is empty.
            bytes.resize(num_samples.max(1) * num_channels.max(1) * 4, 0);
            let payload = match self.codec {
                ChunkCodec::Raw => bytes,
                ChunkCodec::Blosc => blosc_lz4_frame(&bytes, 4),
            };
            store.insert(format!("templates_array/{t}.0.0"), payload);
        }
        store
    }
}
pub fn array_meta(shape: &[usize], chunks: &[usize], dtype: &str, compressor: Value) -> Value {
    json!({
        "zarr_format": 2,
        "shape": shape,
        "chunks": chunks,
        "dtype": dtype,
        "compressor": compressor,
        "fill_value": 0.0,
        "order": "C",
        "filters": null
    })
}
pub fn test_config() -> ViewerConfig {
    ViewerConfig {
        fetch_timeout_secs: 0.5,
        ..ViewerConfig::default()
    }
}
pub fn viewer_over(store: MemoryStore) -> (Arc<MemoryStore>, TemplateViewer) {
    let store = Arc::new(store);
    let session = TemplateSession::new(store.clone(), test_config()).expect("valid config");
    (store, TemplateViewer::new(Arc::new(session)))
}
pub fn slow(store: MemoryStore) -> MemoryStore {
    store.with_latency(Duration::from_millis(20))
}
