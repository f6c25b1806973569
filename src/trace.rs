//! Recorded sweep traces and their on-disk form

use crate::{
    metrics::Metrics,
    sweep::{ ScanDirection, SweepPass },
};

/// One sampled point of a sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint
{
    /// Commanded source voltage, V
    pub voltage: f64,
    /// Measured current density, A/cm²
    pub current_density: f64,
}

/// The ordered samples collected by one sweep pass
///
/// Built incrementally while stepping. A cancelled pass simply stops
/// pushing, leaving a short trace; nothing is ever removed or reordered.
#[derive(Debug, Clone, Default)]
pub struct Trace
{
    points: Vec<TracePoint>,
}

impl Trace
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub(crate) fn with_capacity(points: usize) -> Self
    {
        Self {
            points: Vec::with_capacity(points),
        }
    }

    pub(crate) fn push(&mut self, point: TracePoint)
    {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TracePoint]
    {
        &self.points
    }

    pub fn len(&self) -> usize
    {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.points.is_empty()
    }
}

/// File name for one persisted pass
pub(crate) fn file_name(
    device_name: &str,
    pixel_number: u8,
    pass: SweepPass,
    mode: ScanDirection,
    dark: bool,
) -> String
{
    format!(
        "{}_Pixel_{}_{}{}.txt",
        device_name,
        pixel_number,
        pass.file_tag(mode),
        if dark { "_DARK" } else { "" },
    )
}

/// Renders the persisted form of a completed pass: the figure-of-merit
/// header block followed by tab-separated voltage/current rows
pub(crate) fn render(
    device_name: &str,
    pixel_number: u8,
    dark: bool,
    metrics: &Metrics,
    trace: &Trace,
) -> String
{
    let mut out = String::with_capacity(32 * (trace.len() + 10));

    out.push_str(&format!("Dark Measurement: {}\n", dark));
    out.push_str(&format!("Device Name: {}\n", device_name));
    out.push_str(&format!("Pixel: {}\n", pixel_number));
    out.push_str(&format!("Jsc (mA/cm²): {:.2}\n", metrics.jsc));
    out.push_str(&format!("Voc (V): {:.2}\n", metrics.voc));
    out.push_str(&format!("FF: {:.2}\n", metrics.ff));
    out.push_str(&format!("PCE (%): {:.2}\n\n", metrics.pce));
    out.push_str("Voltage (V)\tCurrent (A)\n");

    for point in trace.points() {
        out.push_str(&format!("{:.6}\t{:.6e}\n", point.voltage, point.current_density));
    }

    out
}
