use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::analysis::probe::ProbeGeometry;
use crate::analysis::view::ViewModel;
use crate::error::{Result, ViewerError};
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub best_channel: RGBColor,
    pub active_channels: RGBColor,
    pub probe_contacts: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(0xf0, 0xf0, 0xf0),
            best_channel: RGBColor(0x5e, 0x91, 0x9e),
            active_channels: RGBColor(0xad, 0xd3, 0xdc),
            probe_contacts: RGBColor(0x7f, 0x7f, 0x7f),
        }
    }
}
/// Widen a degenerate range so the chart still has area.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}
fn finite_extent<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
/// Best channel drawn thick over the thin active-channel traces, time in ms.
pub fn render_template_png(view: &ViewModel, style: &PlotStyle) -> Result<Vec<u8>> {
    let Some((t0, t1)) = finite_extent(view.time_axis_ms.iter()) else {
        return Err(ViewerError::Plot("template has no samples".into()));
    };
    let all_values = view
        .best_channel_series
        .iter()
        .chain(view.active_channel_series.values().flatten());
    let (y0, y1) = finite_extent(all_values).unwrap_or((-1.0, 1.0));
    let (x_range, y_range) = (padded(t0, t1), padded(y0, y1));
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;
        chart.plotting_area().fill(&style.background)?;
        for series in view.active_channel_series.values() {
            let points = view.time_axis_ms.iter().copied().zip(series.iter().copied());
            chart.draw_series(LineSeries::new(points, style.active_channels.stroke_width(1)))?;
        }
        let best = view
            .time_axis_ms
            .iter()
            .copied()
            .zip(view.best_channel_series.iter().copied());
        chart.draw_series(LineSeries::new(best, style.best_channel.stroke_width(4)))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Probe contacts, active rows across the probe width, and the best-channel location.
pub fn render_probe_png(view: &ViewModel, geometry: &ProbeGeometry, style: &PlotStyle) -> Result<Vec<u8>> {
    let Some(bounds) = geometry.bounds() else {
        return Err(ViewerError::Plot("probe has no channels".into()));
    };
    let x_range = padded(bounds.min_x, bounds.max_x);
    let y_range = padded(bounds.min_y, bounds.max_y);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;
        chart.plotting_area().fill(&style.background)?;
        chart.draw_series(
            geometry
                .iter()
                .map(|p| Circle::new(p, 3, style.probe_contacts.filled())),
        )?;
        chart.draw_series(view.probe.active_locations.iter().map(|&(_, y)| {
            PathElement::new(
                vec![(bounds.min_x, y), (bounds.max_x, y)],
                style.active_channels.stroke_width(3),
            )
        }))?;
        let (x, y) = view.location;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_range.0, y), (x_range.1, y)],
            style.best_channel.stroke_width(2),
        )))?;
        chart.draw_series(std::iter::once(Cross::new(
            (x, y),
            6,
            style.best_channel.stroke_width(2),
        )))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ViewerError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
