// Per-template pipeline: fetch, peak-to-peak, channel selection, probe lookup, view assembly.
pub mod amplitude;
pub mod assembler;
pub mod plot;
pub mod probe;
pub mod selection;
pub mod session;
pub mod view;
pub use amplitude::{compute_amplitudes, std_dev};
pub use assembler::{FetchedTemplate, TemplateViewer, ViewTask};
pub use plot::{render_probe_png, render_template_png, PlotStyle};
pub use probe::{locate, locate_many, ProbeAnnotation, ProbeBounds, ProbeGeometry};
pub use selection::{select, ChannelSelector, SelectionResult};
pub use session::TemplateSession;
pub use view::{TableRow, ViewEvent, ViewModel, ViewState};
