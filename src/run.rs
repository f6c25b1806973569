//! Measurement orchestration across a pixel range

use std::{ path::PathBuf, time::Duration };
use tokio::io::{ AsyncReadExt, AsyncWriteExt };
use crate::{
    cancel::CancelToken,
    devices::{ RelayBank, SourceMeter },
    engine::{ PassOutcome, SweepEngine, SweepObserver },
    error::{ DeviceError, RunError },
    metrics::Metrics,
    sweep::{ SweepPass, SweepSpec },
};

/// Hold-off between pixels after the relay has been released
const INTER_PIXEL_SETTLE: Duration = Duration::from_secs(1);

/// One completed pass in the result log
#[derive(Debug, Clone)]
pub struct MeasurementRecord
{
    /// Position in the session, counted from 1 across runs
    pub sequence: u32,
    pub device_name: String,
    /// 1-based pixel number
    pub pixel_number: u8,
    pub direction: SweepPass,
    pub metrics: Metrics,
}

/// Append-only log of completed passes, one record each
#[derive(Debug, Default)]
pub struct MeasurementLog
{
    records: Vec<MeasurementRecord>,
}

impl MeasurementLog
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn records(&self) -> &[MeasurementRecord]
    {
        &self.records
    }

    pub fn len(&self) -> usize
    {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.records.is_empty()
    }

    fn push(&mut self, record: MeasurementRecord)
    {
        self.records.push(record);
    }

    /// Renders the log as comma-separated text with a header row
    pub fn to_csv(&self) -> String
    {
        let mut out = String::from(
            "Measurement #,Device Name,Pixel Number,Scan Direction,Jsc (mA/cm²),Voc (V),FF,PCE (%)\n",
        );

        for record in &self.records {
            out.push_str(&format!(
                "{},{},{},{},{:.2},{:.2},{:.2},{:.2}\n",
                record.sequence,
                record.device_name,
                record.pixel_number,
                record.direction.label(),
                record.metrics.jsc,
                record.metrics.voc,
                record.metrics.ff,
                record.metrics.pce,
            ));
        }

        out
    }
}

/// Drives a full measurement: relay selection, per-pixel sweep passes, and
/// the growing result log
///
/// Owns both device handles for the duration of a run, so nothing else can
/// interleave commands on either transport.
pub struct MeasurementRun<R, S>
{
    relay: RelayBank<R>,
    smu: SourceMeter<S>,
    data_dir: PathBuf,
    log: MeasurementLog,
    next_sequence: u32,
}

impl <R, S> MeasurementRun<R, S>
    where R: AsyncReadExt + AsyncWriteExt + Unpin + Send,
          S: AsyncReadExt + AsyncWriteExt + Unpin + Send
{
    /// Assemble a bench from its two device handles and the directory that
    /// receives trace files
    pub fn new(relay: RelayBank<R>, smu: SourceMeter<S>, data_dir: impl Into<PathBuf>) -> Self
    {
        Self {
            relay: relay,
            smu: smu,
            data_dir: data_dir.into(),
            log: MeasurementLog::new(),
            next_sequence: 1,
        }
    }

    pub fn log(&self) -> &MeasurementLog
    {
        &self.log
    }

    /// Release the device handles and the accumulated log
    pub fn into_parts(self) -> (RelayBank<R>, SourceMeter<S>, MeasurementLog)
    {
        (self.relay, self.smu, self.log)
    }

    /// Execute one measurement over the configured pixel range
    ///
    /// The configuration is validated in full before the first hardware
    /// command; a validation failure rejects the run with nothing started.
    /// Each pixel in the range is selected, swept once per direction leg,
    /// and released, with a fixed settle before the next pixel. Every
    /// completed pass appends one record to the log and writes one trace
    /// file under the data directory.
    ///
    /// A stop request through `cancel` ends the in-flight pass
    /// cooperatively; the active relay is still released and no further
    /// pixel is started. Device failures abort the run after a best-effort
    /// relay release, since a relay left closed would put every later
    /// measurement on the wrong pixel.
    pub async fn run<O>(
        &mut self,
        spec: &SweepSpec,
        cancel: &CancelToken,
        observer: &mut O,
    )
        -> Result<(), RunError>

        where O: SweepObserver
    {
        let plan = spec.compile()?;

        if !self.relay.is_connected() || !self.smu.is_connected() {
            return Err(RunError::Device(DeviceError::NotConnected));
        }

        log::info!(
            "run started for {}: pixels {}..={}, {:?}{}",
            plan.device_name(),
            plan.pixel_from,
            plan.pixel_to,
            plan.direction(),
            if plan.is_dark() { ", dark" } else { "" },
        );

        for channel in plan.channels() {
            if cancel.is_cancelled() {
                log::info!("run stopped before pixel {}", channel + 1);
                break;
            }

            let pixel_number = channel + 1;
            self.relay.select(channel, true).await?;

            let mut cancelled = false;

            for &pass in plan.direction().passes() {
                let mut engine =
                    SweepEngine::new(&mut self.smu, &plan, &self.data_dir, observer, cancel);

                let outcome = match engine.run_pass(pixel_number, pass).await {
                    Ok(outcome) => outcome,
                    Err(run_err) => {
                        // leave the bench deselected even though the pass died
                        if let Err(relay_err) = self.relay.select(channel, false).await {
                            log::error!(
                                "failed to release relay {} after abort: {}",
                                channel, relay_err,
                            );
                        }

                        return Err(run_err);
                    }
                };

                match outcome {
                    PassOutcome::Completed { metrics, .. } => {
                        let record = MeasurementRecord {
                            sequence: self.next_sequence,
                            device_name: plan.device_name().to_string(),
                            pixel_number: pixel_number,
                            direction: pass,
                            metrics: metrics,
                        };
                        self.next_sequence += 1;
                        self.log.push(record);
                    }
                    PassOutcome::Cancelled { trace } => {
                        log::info!("pass cancelled with {} points recorded", trace.len());
                        cancelled = true;
                        break;
                    }
                }
            }

            self.relay.select(channel, false).await?;

            if cancelled {
                break;
            }

            tokio::time::sleep(INTER_PIXEL_SETTLE).await;
        }

        log::info!("run finished with {} records in the log", self.log.len());

        Ok(())
    }
}
