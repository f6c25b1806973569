//! Smoke test against a real bench
//!
//! Wire the relay bank and the source meter to two serial ports and run:
//!
//! ```bash
//! export PVSWEEP_HW_TEST=1
//! export PVSWEEP_RELAY_PORT=/dev/ttyUSB0
//! export PVSWEEP_SMU_PORT=/dev/ttyS0
//! cargo test --test hardware -- --nocapture
//! ```
//!
//! Skipped silently unless `PVSWEEP_HW_TEST=1` is set: this energizes
//! relays and drives real voltage at whatever is wired to pixel 1.

use pvsweep::{
    CancelToken, MeasurementRun, NullObserver, RelayBank, ScanDirection, SourceMeter, SweepSpec,
};
use tokio_serial::SerialPortBuilderExt;

fn enabled() -> bool
{
    std::env::var("PVSWEEP_HW_TEST")
        .map(|flag| flag == "1")
        .unwrap_or(false)
}

fn port(var: &str, default: &str) -> String
{
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

#[tokio::test]
async fn forward_dark_sweep_on_the_bench()
{
    if !enabled() {
        println!("bench smoke test skipped (set PVSWEEP_HW_TEST=1 to enable)");
        return;
    }

    let _ = env_logger::builder().is_test(true).try_init();

    let relay_port = tokio_serial::new(port("PVSWEEP_RELAY_PORT", "/dev/ttyUSB0"), 9600)
        .open_native_async()
        .expect("failed to open the relay port");
    let smu_port = tokio_serial::new(port("PVSWEEP_SMU_PORT", "/dev/ttyS0"), 9600)
        .open_native_async()
        .expect("failed to open the instrument port");

    let data_dir = tempfile::tempdir().expect("tempdir");
    let mut bench = MeasurementRun::new(
        RelayBank::with(relay_port),
        SourceMeter::with(smu_port),
        data_dir.path(),
    );

    let spec = SweepSpec::new()
        .device_name("smoke")
        .voltage_min(-0.1)
        .voltage_max(1.2)
        .step_size(0.01)
        .sweep_rate(0.1)
        .area_cm2(0.09)
        .direction(ScanDirection::Forward)
        .pixel_from(1)
        .pixel_to(1)
        .dark(true);

    bench
        .run(&spec, &CancelToken::new(), &mut NullObserver)
        .await
        .expect("bench run failed");

    assert_eq!(bench.log().len(), 1);
    println!("{}", bench.log().to_csv());
    println!("trace files under {}", data_dir.path().display());
}
