//! The sweep engine: executes one voltage program against the bench
//!
//! # Pass lifecycle
//! A pass moves through `Priming` (instrument reset and, for illuminated
//! sweeps, light-on plus soak delay), `Stepping` (the program loop), and
//! `Finalizing`, ending in either `Completed` or `Cancelled`. Finalizing
//! (illumination off, then output off) runs on every exit path, including
//! cancellation and transport failure, so the bench is never left energized
//! by a dead pass.
//!
//! # Cancellation
//! The stop token is observed at the top of every step, never mid-command,
//! so a voltage command already written is allowed to land before the loop
//! exits. A cancelled pass keeps its partial trace in memory but computes no
//! figures of merit and writes no file.

use std::path::{ Path, PathBuf };
use tokio::io::{ AsyncReadExt, AsyncWriteExt };
use crate::{
    cancel::CancelToken,
    devices::SourceMeter,
    error::{ DeviceError, RunError },
    metrics::Metrics,
    reading::ReadError,
    sweep::{ RunPlan, SweepPass, SweepProgram },
    trace::{ self, Trace, TracePoint },
};

/// Observable lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState
{
    Idle,
    Priming,
    Stepping,
    Finalizing,
    Completed,
    Cancelled,
}

/// Receives each point as soon as it has been committed to the trace
///
/// A live plot hangs off this seam. The callback runs between steps on the
/// measurement task and is invoked only after the point is in the trace, so
/// a slow observer can stretch the sweep but can never desynchronize the
/// voltage and current sequences. Anything genuinely slow belongs on
/// another task fed from here.
pub trait SweepObserver
{
    fn point_recorded(&mut self, pixel_number: u8, pass: SweepPass, point: &TracePoint)
    {
        let _ = (pixel_number, pass, point);
    }
}

/// Observer that discards every notification
pub struct NullObserver;

impl SweepObserver for NullObserver {}

/// End result of one pass
#[derive(Debug)]
pub enum PassOutcome
{
    /// The full program ran; figures of merit were computed and the trace
    /// was written out
    Completed
    {
        trace: Trace,
        metrics: Metrics,
        trace_file: PathBuf,
    },
    /// A stop request ended the pass early; the partial trace is returned
    /// but nothing was persisted and no metrics were computed
    Cancelled
    {
        trace: Trace,
    },
}

/// Drives one pixel's sweep passes over a borrowed instrument handle
pub struct SweepEngine<'r, T, O>
{
    smu: &'r mut SourceMeter<T>,
    plan: &'r RunPlan,
    data_dir: &'r Path,
    observer: &'r mut O,
    cancel: &'r CancelToken,
    state: SweepState,
}

impl <'r, T, O> SweepEngine<'r, T, O>
    where T: AsyncReadExt + AsyncWriteExt + Unpin + Send,
          O: SweepObserver
{
    pub fn new(
        smu: &'r mut SourceMeter<T>,
        plan: &'r RunPlan,
        data_dir: &'r Path,
        observer: &'r mut O,
        cancel: &'r CancelToken,
    )
        -> Self
    {
        Self {
            smu: smu,
            plan: plan,
            data_dir: data_dir,
            observer: observer,
            cancel: cancel,
            state: SweepState::Idle,
        }
    }

    pub fn state(&self) -> SweepState
    {
        self.state
    }

    /// Run one pass for the given pixel
    ///
    /// On success the outcome is [`PassOutcome::Completed`] or
    /// [`PassOutcome::Cancelled`]; a transport failure aborts the pass with
    /// an error after the finalization commands have been attempted.
    pub async fn run_pass(&mut self, pixel_number: u8, pass: SweepPass) -> Result<PassOutcome, RunError>
    {
        let program = self.plan.program(pass);
        log::info!(
            "pixel {} {} sweep: {} points, {:?} per step",
            pixel_number,
            pass.label(),
            program.len(),
            program.step_delay(),
        );

        let mut recorded = Trace::with_capacity(program.len());
        let stepped = match self.prime().await {
            Ok(()) => {
                self.transition(SweepState::Stepping);
                self.step_loop(&program, pixel_number, pass, &mut recorded).await
            }
            Err(device_err) => Err(device_err),
        };

        self.transition(SweepState::Finalizing);
        let finalized = self.finalize().await;

        match stepped {
            Err(device_err) => {
                if let Err(cleanup_err) = finalized {
                    log::error!("cleanup after aborted pass also failed: {}", cleanup_err);
                }
                self.transition(SweepState::Idle);

                Err(RunError::Device(device_err))
            }
            Ok(false) => {
                // a failed cleanup must not mask the cancellation outcome
                if let Err(cleanup_err) = finalized {
                    log::error!("cleanup after cancelled pass failed: {}", cleanup_err);
                }
                self.transition(SweepState::Cancelled);
                log::info!(
                    "pixel {} {} sweep cancelled after {} of {} points",
                    pixel_number,
                    pass.label(),
                    recorded.len(),
                    program.len(),
                );

                Ok(PassOutcome::Cancelled { trace: recorded })
            }
            Ok(true) => {
                finalized?;

                let metrics = Metrics::from_trace(&recorded);
                let trace_file = self.data_dir.join(trace::file_name(
                    &self.plan.device_name,
                    pixel_number,
                    pass,
                    self.plan.direction,
                    self.plan.dark,
                ));
                let contents = trace::render(
                    &self.plan.device_name,
                    pixel_number,
                    self.plan.dark,
                    &metrics,
                    &recorded,
                );
                tokio::fs::write(&trace_file, contents)
                    .await
                    .map_err(RunError::Storage)?;

                self.transition(SweepState::Completed);
                log::info!(
                    "pixel {} {} sweep completed: {} points -> {}",
                    pixel_number,
                    pass.label(),
                    recorded.len(),
                    trace_file.display(),
                );

                Ok(PassOutcome::Completed {
                    trace: recorded,
                    metrics: metrics,
                    trace_file: trace_file,
                })
            }
        }
    }

    fn transition(&mut self, next: SweepState)
    {
        log::debug!("sweep engine: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Instrument reset and configuration, output on, and the illumination
    /// soak for light measurements
    async fn prime(&mut self) -> Result<(), DeviceError>
    {
        self.transition(SweepState::Priming);

        self.smu.reset().await?;
        self.smu.set_output(true).await?;

        if !self.plan.dark {
            self.smu.set_illumination(true).await?;
            tokio::time::sleep(self.plan.pre_sweep_delay).await;
        }

        Ok(())
    }

    /// Executes the program; `Ok(true)` when every point ran, `Ok(false)`
    /// when a stop request ended the loop early
    async fn step_loop(
        &mut self,
        program: &SweepProgram,
        pixel_number: u8,
        pass: SweepPass,
        recorded: &mut Trace,
    )
        -> Result<bool, DeviceError>
    {
        for &volts in program.voltages() {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }

            self.smu.set_voltage(volts).await?;
            tokio::time::sleep(program.step_delay()).await;

            let current_density = match self.smu.read_current().await {
                Ok(amps) => amps / self.plan.area_cm2,
                Err(ReadError::Reply(format_err)) => {
                    // a zeroed sample keeps the voltage and current
                    // sequences aligned point for point
                    log::warn!("unreadable measurement at {} V, recording 0.0: {}", volts, format_err);
                    0.0
                }
                Err(ReadError::Device(device_err)) => {
                    return Err(device_err);
                }
            };

            let point = TracePoint {
                voltage: volts,
                current_density: current_density,
            };
            recorded.push(point);
            // the point is committed; observers may see it now
            self.observer.point_recorded(pixel_number, pass, &point);
        }

        Ok(true)
    }

    /// Unconditional cleanup: illumination off, then output off
    async fn finalize(&mut self) -> Result<(), DeviceError>
    {
        let lamp = self.smu.set_illumination(false).await;
        let output = self.smu.set_output(false).await;

        lamp.and(output)
    }
}
