// Read-only Zarr v2 client: metadata, chunk codecs and sliced reads over a key/value store.
pub mod codec;
pub mod group;
pub mod http;
pub mod metadata;
pub mod slice;
pub mod store;
pub use group::{AccessMode, ArrayHandle, DatasetHandle, StoreClient};
pub use http::HttpStore;
pub use metadata::{ArrayMetadata, Compressor, DataType, Order};
pub use slice::IndexSpec;
pub use store::{ArrayStore, MemoryStore};
