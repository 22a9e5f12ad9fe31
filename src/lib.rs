pub mod analysis;
pub mod config;
pub mod error;
pub mod zarr;
#[cfg(test)]
mod testutil;
pub use analysis::{TemplateSession, TemplateViewer, ViewEvent, ViewModel, ViewState};
pub use config::ViewerConfig;
pub use error::{ErrorKind, Result, ViewerError};
