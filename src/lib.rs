//! Automated J-V characterization of pixelated photovoltaic test devices
//!
//! This library drives a current-voltage measurement bench: it selects test
//! pixels through a serial relay bank, steps a source-measurement unit
//! through a programmed voltage sweep, parses the measurement replies
//! defensively, and derives the standard figures of merit (Jsc, Voc, FF,
//! PCE) from every recorded curve. Completed curves are persisted as
//! plain-text trace files and summarized in an exportable result log.
//!
//! Device handles are generic over any tokio byte stream, so a bench can
//! hang off local serial ports, a TCP serial bridge, or in-memory pipes in
//! tests. One logical task drives everything: commands are awaited one at a
//! time and all timing (relay settle, pre-sweep soak, per-step delay) is
//! plain timed waiting between commands.

pub mod cancel;
pub mod cmd;
pub mod devices;
pub mod engine;
pub mod error;
mod executor;
pub mod metrics;
pub mod reading;
pub mod run;
pub mod sweep;
pub mod trace;

pub use cancel::CancelToken;
pub use devices::{ RelayBank, SourceMeter, RELAY_SETTLE };
pub use engine::{ NullObserver, PassOutcome, SweepEngine, SweepObserver, SweepState };
pub use error::{ ConfigError, DeviceError, RunError };
pub use metrics::Metrics;
pub use reading::{ ReadError, ReplyFormatError };
pub use run::{ MeasurementLog, MeasurementRecord, MeasurementRun };
pub use sweep::{ RunPlan, ScanDirection, SweepPass, SweepProgram, SweepSpec };
pub use trace::{ Trace, TracePoint };
