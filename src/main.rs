use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info};
use tokio::sync::mpsc;
use spike_template_viewer::analysis::{render_probe_png, render_template_png, PlotStyle};
use spike_template_viewer::{TemplateSession, TemplateViewer, ViewModel, ViewState, ViewerConfig};
#[derive(Parser, Debug)]
#[command(name = "spike-template-viewer", about = "Inspect spike templates from a remote Zarr database")]
struct Args {
    /// JSON file with viewer settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    url: Option<String>,
    /// Activity threshold as a fraction of the best channel's peak-to-peak.
    #[arg(long)]
    threshold: Option<f64>,
    /// Per-fetch timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,
    /// Write template_<i>.png and probe_<i>.png here.
    #[arg(long)]
    render_dir: Option<PathBuf>,
    /// Print each view model as JSON instead of a summary line.
    #[arg(long)]
    json: bool,
    #[arg(default_values_t = [5usize])]
    indices: Vec<usize>,
}
fn load_config(args: &Args) -> anyhow::Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(ratio) = args.threshold {
        config.threshold_ratio = ratio;
    }
    if let Some(secs) = args.timeout {
        config.fetch_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}
async fn render(viewer: &TemplateViewer, view: &ViewModel, dir: &Path) -> anyhow::Result<()> {
    let style = PlotStyle::default();
    let geometry = viewer.session().geometry().await?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let index = view.template_index;
    let template_path = dir.join(format!("template_{index}.png"));
    std::fs::write(&template_path, render_template_png(view, &style)?)
        .with_context(|| format!("writing {}", template_path.display()))?;
    let probe_path = dir.join(format!("probe_{index}.png"));
    std::fs::write(&probe_path, render_probe_png(view, &geometry, &style)?)
        .with_context(|| format!("writing {}", probe_path.display()))?;
    info!("wrote {} and {}", template_path.display(), probe_path.display());
    Ok(())
}
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args).context("invalid configuration")?;
    info!("template database: {}", config.base_url);
    let session = TemplateSession::http(config).context("failed to create store client")?;
    let viewer = TemplateViewer::new(Arc::new(session));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tasks: Vec<_> = args
        .indices
        .iter()
        .map(|&index| viewer.spawn(index, tx.clone()))
        .collect();
    drop(tx);
    let (mut ready, mut failed) = (0usize, 0usize);
    while let Some(event) = rx.recv().await {
        let index = event.template_index;
        match event.state {
            ViewState::Fetching => info!("template {index}: fetching"),
            ViewState::Computing => info!("template {index}: computing"),
            ViewState::Ready(view) => {
                ready += 1;
                if args.json {
                    println!("{}", serde_json::to_string(view.as_ref())?);
                } else {
                    println!("{}", view.summary_line());
                }
                if let Some(dir) = &args.render_dir {
                    if let Err(e) = render(&viewer, &view, dir).await {
                        error!("template {index}: rendering failed: {e:#}");
                    }
                }
            }
            ViewState::Failed { kind, message } => {
                failed += 1;
                error!("template {index}: {kind:?} error: {message}");
            }
        }
    }
    for task in tasks {
        task.join().await;
    }
    if ready == 0 && failed > 0 {
        bail!("all {failed} template(s) failed");
    }
    Ok(())
}
