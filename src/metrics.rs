//! Photovoltaic figures of merit derived from a completed trace

use crate::trace::Trace;

/// The four standard figures of merit for one J-V curve
///
/// All four are estimated directly on the sampled points with no
/// interpolation or fitting, so their resolution is bounded by the
/// program's step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics
{
    /// Short-circuit current density, mA/cm²
    pub jsc: f64,
    /// Open-circuit voltage, V
    pub voc: f64,
    /// Fill factor, nominally in [0, 1]
    pub ff: f64,
    /// Power-conversion efficiency, percent
    pub pce: f64,
}

impl Metrics
{
    /// Compute all four figures from a trace
    ///
    /// A pure function of the points: calling it twice on the same trace
    /// yields identical results.
    ///
    /// The open-circuit search walks the points in recorded order. For a
    /// reverse sweep that order is descending voltage, so on a non-monotonic curve
    /// it finds the first transition in time, not the lowest-voltage one.
    /// Whenever `Voc` or `Jsc` comes out zero, `FF` and `PCE` are reported
    /// as exactly zero rather than as a division artifact.
    pub fn from_trace(trace: &Trace) -> Self
    {
        let jsc = Self::short_circuit(trace);
        let voc = Self::open_circuit(trace);
        let ff = Self::fill_factor(trace, voc, jsc);
        let pce = Self::efficiency(jsc, voc, ff);

        Self {
            jsc: jsc,
            voc: voc,
            ff: ff,
            pce: pce,
        }
    }

    /// Largest current density on the curve, scaled to mA/cm²
    fn short_circuit(trace: &Trace) -> f64
    {
        let peak = trace
            .points()
            .iter()
            .map(|point| point.current_density)
            .fold(f64::NEG_INFINITY, f64::max);

        if peak.is_finite() {
            peak * 1000.0
        }
        else {
            // empty trace
            0.0
        }
    }

    /// Voltage at the first positive-to-non-positive crossing, in recorded
    /// order; zero when the curve never crosses
    fn open_circuit(trace: &Trace) -> f64
    {
        for pair in trace.points().windows(2) {
            if pair[0].current_density > 0.0 && pair[1].current_density <= 0.0 {
                return pair[0].voltage;
            }
        }

        0.0
    }

    fn fill_factor(trace: &Trace, voc: f64, jsc: f64) -> f64
    {
        if voc == 0.0 || jsc == 0.0 {
            return 0.0;
        }

        let peak_power = trace
            .points()
            .iter()
            .map(|point| point.voltage * point.current_density)
            .fold(f64::NEG_INFINITY, f64::max);

        peak_power / (voc * jsc)
    }

    fn efficiency(jsc: f64, voc: f64, ff: f64) -> f64
    {
        if jsc == 0.0 || voc == 0.0 || ff == 0.0 {
            return 0.0;
        }

        (jsc * voc * ff) / 10.0
    }
}
