//! Sweep configuration, validation, and voltage program generation

use std::time::Duration;
use crate::error::ConfigError;

/// Scan mode requested for a measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection
{
    Forward,
    Reverse,
    /// Forward then reverse, executed as two independent passes
    Both,
}

impl ScanDirection
{
    /// The single-direction passes this mode executes, in order
    pub fn passes(self) -> &'static [SweepPass]
    {
        match self {
            ScanDirection::Forward => &[SweepPass::Forward],
            ScanDirection::Reverse => &[SweepPass::Reverse],
            ScanDirection::Both => &[SweepPass::Forward, SweepPass::Reverse],
        }
    }
}

/// One single-direction leg of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPass
{
    Forward,
    Reverse,
}

impl SweepPass
{
    /// Direction label shown in measurement records and exports
    pub fn label(self) -> &'static str
    {
        match self {
            SweepPass::Forward => "Forward",
            SweepPass::Reverse => "Reverse",
        }
    }

    /// Tag embedded in trace file names
    ///
    /// A standalone reverse sweep is tagged `RS`; the reverse leg of a
    /// both-directions run is tagged `REV`.
    pub(crate) fn file_tag(self, mode: ScanDirection) -> &'static str
    {
        match (self, mode) {
            (SweepPass::Forward, _) => "FWD",
            (SweepPass::Reverse, ScanDirection::Both) => "REV",
            (SweepPass::Reverse, _) => "RS",
        }
    }
}

/// Measurement parameters as entered by the operator
///
/// All numeric fields and the device name start unset and are required; the
/// scan direction defaults to both legs, the pre-sweep soak to five seconds,
/// and the dark flag to off. Nothing is checked until [`SweepSpec::compile`],
/// which performs every validation in one place and returns a ready-to-run
/// [`RunPlan`]; no hardware is touched before that succeeds.
#[derive(Clone, Default)]
pub struct SweepSpec
{
    device_name: Option<String>,
    voltage_min: Option<f64>,
    voltage_max: Option<f64>,
    step_size: Option<f64>,
    sweep_rate: Option<f64>,
    area_cm2: Option<f64>,
    pixel_from: Option<u8>,
    pixel_to: Option<u8>,
    direction: Option<ScanDirection>,
    pre_sweep_delay: Option<Duration>,
    dark: bool,
}

impl SweepSpec
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Name of the device under test; becomes part of every trace file name
    pub fn device_name(mut self, name: impl Into<String>) -> Self
    {
        self.device_name = Some(name.into());
        self
    }

    /// Lower sweep bound, volts
    pub fn voltage_min(mut self, volts: f64) -> Self
    {
        self.voltage_min = Some(volts);
        self
    }

    /// Upper sweep bound, volts
    pub fn voltage_max(mut self, volts: f64) -> Self
    {
        self.voltage_max = Some(volts);
        self
    }

    /// Voltage increment between steps, volts
    pub fn step_size(mut self, volts: f64) -> Self
    {
        self.step_size = Some(volts);
        self
    }

    /// Sweep speed, volts per second
    pub fn sweep_rate(mut self, volts_per_second: f64) -> Self
    {
        self.sweep_rate = Some(volts_per_second);
        self
    }

    /// Active area of one pixel, cm²
    pub fn area_cm2(mut self, area: f64) -> Self
    {
        self.area_cm2 = Some(area);
        self
    }

    /// First pixel to measure, 1-based
    pub fn pixel_from(mut self, pixel: u8) -> Self
    {
        self.pixel_from = Some(pixel);
        self
    }

    /// Last pixel to measure, 1-based, inclusive
    pub fn pixel_to(mut self, pixel: u8) -> Self
    {
        self.pixel_to = Some(pixel);
        self
    }

    pub fn direction(mut self, direction: ScanDirection) -> Self
    {
        self.direction = Some(direction);
        self
    }

    /// Soak time under illumination before the first step of each pass
    pub fn pre_sweep_delay(mut self, delay: Duration) -> Self
    {
        self.pre_sweep_delay = Some(delay);
        self
    }

    /// Measure with the illumination source off
    pub fn dark(mut self, dark: bool) -> Self
    {
        self.dark = dark;
        self
    }

    /// Validate every field and produce an executable plan
    ///
    /// Holding a [`RunPlan`] means every configuration check has passed.
    pub fn compile(&self) -> Result<RunPlan, ConfigError>
    {
        let device_name = self
            .device_name
            .clone()
            .ok_or(ConfigError::MissingField("device_name"))?;
        if device_name.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }

        let voltage_min = self.voltage_min.ok_or(ConfigError::MissingField("voltage_min"))?;
        let voltage_max = self.voltage_max.ok_or(ConfigError::MissingField("voltage_max"))?;
        let step_size = self.step_size.ok_or(ConfigError::MissingField("step_size"))?;
        let sweep_rate = self.sweep_rate.ok_or(ConfigError::MissingField("sweep_rate"))?;
        let area_cm2 = self.area_cm2.ok_or(ConfigError::MissingField("area_cm2"))?;
        let pixel_from = self.pixel_from.ok_or(ConfigError::MissingField("pixel_from"))?;
        let pixel_to = self.pixel_to.ok_or(ConfigError::MissingField("pixel_to"))?;

        let numeric_fields = [
            ("voltage_min", voltage_min),
            ("voltage_max", voltage_max),
            ("step_size", step_size),
            ("sweep_rate", sweep_rate),
            ("area_cm2", area_cm2),
        ];
        for (field, value) in numeric_fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(field));
            }
        }

        if step_size <= 0.0 {
            return Err(ConfigError::NonPositive("step_size"));
        }
        if sweep_rate <= 0.0 {
            return Err(ConfigError::NonPositive("sweep_rate"));
        }
        if area_cm2 <= 0.0 {
            return Err(ConfigError::NonPositive("area_cm2"));
        }
        if voltage_max <= voltage_min {
            return Err(ConfigError::InvertedVoltageWindow);
        }
        if step_size > voltage_max - voltage_min {
            return Err(ConfigError::StepExceedsWindow);
        }

        for bound in [pixel_from, pixel_to] {
            if bound < 1 || bound > 8 {
                return Err(ConfigError::PixelOutOfRange(bound));
            }
        }
        if pixel_from > pixel_to {
            return Err(ConfigError::InvertedPixelRange);
        }

        Ok(RunPlan {
            device_name: device_name,
            voltage_min: voltage_min,
            voltage_max: voltage_max,
            step_size: step_size,
            sweep_rate: sweep_rate,
            area_cm2: area_cm2,
            pixel_from: pixel_from,
            pixel_to: pixel_to,
            direction: self.direction.unwrap_or(ScanDirection::Both),
            pre_sweep_delay: self.pre_sweep_delay.unwrap_or(Duration::from_secs(5)),
            dark: self.dark,
        })
    }
}

/// A validated, ready-to-execute measurement configuration
///
/// Constructed only by [`SweepSpec::compile`].
#[derive(Debug, Clone)]
pub struct RunPlan
{
    pub(crate) device_name: String,
    pub(crate) voltage_min: f64,
    pub(crate) voltage_max: f64,
    pub(crate) step_size: f64,
    pub(crate) sweep_rate: f64,
    pub(crate) area_cm2: f64,
    pub(crate) pixel_from: u8,
    pub(crate) pixel_to: u8,
    pub(crate) direction: ScanDirection,
    pub(crate) pre_sweep_delay: Duration,
    pub(crate) dark: bool,
}

impl RunPlan
{
    pub fn device_name(&self) -> &str
    {
        &self.device_name
    }

    pub fn direction(&self) -> ScanDirection
    {
        self.direction
    }

    pub fn is_dark(&self) -> bool
    {
        self.dark
    }

    /// Zero-based relay channels covered by the pixel range, ascending
    pub fn channels(&self) -> std::ops::RangeInclusive<u8>
    {
        (self.pixel_from - 1)..=(self.pixel_to - 1)
    }

    /// Build the voltage program for one leg of this plan
    pub fn program(&self, pass: SweepPass) -> SweepProgram
    {
        SweepProgram::generate(self.voltage_min, self.voltage_max, self.step_size, self.sweep_rate, pass)
    }
}

/// An ordered voltage program with its fixed inter-step delay
///
/// The far boundary is excluded: a forward program runs from `voltage_min`
/// up to but not including `voltage_max`, a reverse program from
/// `voltage_max` down to but not including `voltage_min`. The program takes
/// `(voltage_max − voltage_min) / sweep_rate` seconds in total, spread over
/// the gaps between points; a one-point program has no gaps and gets a zero
/// delay.
pub struct SweepProgram
{
    voltages: Vec<f64>,
    step_delay: Duration,
}

impl SweepProgram
{
    pub fn generate(
        voltage_min: f64,
        voltage_max: f64,
        step_size: f64,
        sweep_rate: f64,
        pass: SweepPass,
    )
        -> Self
    {
        let window = voltage_max - voltage_min;
        let points = (window / step_size).ceil().max(1.0) as usize;

        let voltages = (0..points)
            .map(|index| match pass {
                SweepPass::Forward => voltage_min + index as f64 * step_size,
                SweepPass::Reverse => voltage_max - index as f64 * step_size,
            })
            .collect();

        let step_delay = if points > 1 {
            Duration::from_secs_f64((window / sweep_rate) / (points - 1) as f64)
        }
        else {
            Duration::ZERO
        };

        Self {
            voltages: voltages,
            step_delay: step_delay,
        }
    }

    pub fn voltages(&self) -> &[f64]
    {
        &self.voltages
    }

    pub fn step_delay(&self) -> Duration
    {
        self.step_delay
    }

    pub fn len(&self) -> usize
    {
        self.voltages.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.voltages.is_empty()
    }
}
