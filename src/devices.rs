//! Device handles for the measurement bench
//!
//! # Purpose
//! This module defines handles to active I/O streams which provide
//! high-level RPCs for the two pieces of bench hardware:
//!   - The source-measurement unit that drives the voltage sweep and reads
//!     back current
//!   - The relay bank that connects one of up to eight test pixels to the
//!     instrument terminals
//!
//! Creating I/O handles is not handled by this library so that you are not
//! restricted to connecting to the hardware via a particular interface. For
//! instance, it may be desirable to use a TCP/IP serial bridge so that the
//! bench can be controlled remotely instead of over a local RS232 line, and
//! the tests drive both devices over in-memory pipes.
//!
//! # Timing
//! Every RPC is a plain sequential await: one command is in flight at a
//! time, and nothing here inserts hidden settling delays except the relay's
//! fixed contact-settle hold, which is part of the select contract. There is
//! no per-command I/O timeout; a hung transport hangs the run.

use std::time::Duration;
use tokio::io::{ AsyncReadExt, AsyncWriteExt };
use crate::{
    cmd::{ RelayCmd, SmuCmd, COMPLIANCE_AMPS },
    error::DeviceError,
    executor::LineExecutor,
    reading::{ self, ReadError },
};

/// Time allowed for a relay's contacts to settle after a select command
pub const RELAY_SETTLE: Duration = Duration::from_millis(500);

/// A connected source-measurement unit
pub struct SourceMeter<T>
{
    link: Option<LineExecutor<T>>,
}

impl <T> SourceMeter<T>
    where T: AsyncReadExt + AsyncWriteExt + Unpin + Send
{
    /// Construct a new handle from an async I/O stream
    pub fn with(io_handle: T) -> Self
    {
        Self {
            link: Some(LineExecutor::with("\n", io_handle)),
        }
    }

    /// Close the handle, returning the transport if one was open
    ///
    /// Subsequent commands fail with [`DeviceError::NotConnected`].
    pub fn disconnect(&mut self) -> Option<T>
    {
        self.link.take().map(LineExecutor::into_inner)
    }

    pub fn is_connected(&self) -> bool
    {
        self.link.is_some()
    }

    fn link_mut(&mut self) -> Result<&mut LineExecutor<T>, DeviceError>
    {
        self.link.as_mut().ok_or(DeviceError::NotConnected)
    }

    /// Reset the instrument and program the fixed sweep configuration
    ///
    /// Idempotent; issued before every run. Routes to the rear terminals,
    /// selects voltage sourcing and current sensing, and programs the fixed
    /// compliance limit of [`COMPLIANCE_AMPS`].
    pub async fn reset(&mut self) -> Result<(), DeviceError>
    {
        let link = self.link_mut()?;

        link.send(SmuCmd::Reset).await?;
        link.send(SmuCmd::RearTerminals).await?;
        link.send(SmuCmd::SourceFunctionVolts).await?;
        link.send(SmuCmd::SenseFunctionAmps).await?;
        link.send(SmuCmd::CurrentProtection(COMPLIANCE_AMPS)).await?;
        log::debug!("instrument reset and configured");

        Ok(())
    }

    /// Switch the source output on or off
    pub async fn set_output(&mut self, on: bool) -> Result<(), DeviceError>
    {
        self.link_mut()?.send(SmuCmd::Output(on)).await?;

        Ok(())
    }

    /// Command the source terminal to the given voltage
    ///
    /// Does not wait for the output to settle; step timing belongs to the
    /// caller.
    pub async fn set_voltage(&mut self, volts: f64) -> Result<(), DeviceError>
    {
        self.link_mut()?.send(SmuCmd::SourceVolts(volts)).await?;

        Ok(())
    }

    /// Switch the TTL-controlled light source on or off
    ///
    /// The line is wired active-low: driving it low turns the illumination
    /// on.
    pub async fn set_illumination(&mut self, on: bool) -> Result<(), DeviceError>
    {
        self.link_mut()?.send(SmuCmd::AuxTtl(!on)).await?;
        log::debug!("illumination {}", if on { "on" } else { "off" });

        Ok(())
    }

    /// Trigger one measurement and extract the current reading in amperes
    ///
    /// A reply that arrives but cannot be interpreted comes back as
    /// [`ReadError::Reply`]; sweep code substitutes a zeroed sample for
    /// those instead of aborting.
    pub async fn read_current(&mut self) -> Result<f64, ReadError>
    {
        let link = self.link_mut()?;
        let reply = link.query(SmuCmd::Read).await?;
        let amps = reading::parse_current_amps(&reply)?;

        Ok(amps)
    }
}

/// A connected relay bank selecting one of eight test pixels
pub struct RelayBank<T>
{
    link: Option<LineExecutor<T>>,
}

impl <T> RelayBank<T>
    where T: AsyncReadExt + AsyncWriteExt + Unpin + Send
{
    /// Construct a new handle from an async I/O stream
    pub fn with(io_handle: T) -> Self
    {
        Self {
            link: Some(LineExecutor::with("\n", io_handle)),
        }
    }

    /// Close the handle, returning the transport if one was open
    ///
    /// Subsequent commands fail with [`DeviceError::NotConnected`].
    pub fn disconnect(&mut self) -> Option<T>
    {
        self.link.take().map(LineExecutor::into_inner)
    }

    pub fn is_connected(&self) -> bool
    {
        self.link.is_some()
    }

    /// Energize or release one relay channel
    ///
    /// Sends the two-token select frame and then holds for [`RELAY_SETTLE`]
    /// so the contacts are quiet before any instrument command follows.
    /// There is no retry: a failure here aborts the pixel's measurement.
    ///
    /// Channel indices are zero-based; callers validate the pixel range
    /// before getting here, so an out-of-range index is a programming error.
    pub async fn select(&mut self, channel: u8, energize: bool) -> Result<(), DeviceError>
    {
        assert!(channel < 8, "relay channel out of range: {}", channel);

        let link = self.link.as_mut().ok_or(DeviceError::NotConnected)?;
        link.send(RelayCmd { channel: channel, energize: energize }).await?;
        log::debug!("relay {} {}", channel, if energize { "energized" } else { "released" });
        tokio::time::sleep(RELAY_SETTLE).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::{ RelayBank, SourceMeter };
    use crate::{ error::DeviceError, reading::ReadError };
    use tokio::io::{ AsyncReadExt, AsyncWriteExt };

    async fn drain(peer: &mut tokio::io::DuplexStream) -> String
    {
        let mut buf = vec![0u8; 512];
        let buffered = peer.read(&mut buf).await.unwrap();

        String::from_utf8(buf[..buffered].to_vec()).unwrap()
    }

    #[tokio::test]
    async fn reset_programs_the_fixed_configuration()
    {
        let (io_handle, mut peer) = tokio::io::duplex(512);
        let mut smu = SourceMeter::with(io_handle);

        smu.reset().await.unwrap();

        assert_eq!(
            drain(&mut peer).await,
            "*RST\n:ROUT:TERM REAR\n:SOUR:FUNC VOLT\n:SENS:FUNC 'CURR'\n:SENS:CURR:PROT 0.10\n",
        );
    }

    #[tokio::test]
    async fn illumination_polarity_is_inverted()
    {
        let (io_handle, mut peer) = tokio::io::duplex(64);
        let mut smu = SourceMeter::with(io_handle);

        smu.set_illumination(true).await.unwrap();
        assert_eq!(drain(&mut peer).await, ":SOUR2:TTL 0\n");

        smu.set_illumination(false).await.unwrap();
        assert_eq!(drain(&mut peer).await, ":SOUR2:TTL 1\n");
    }

    #[tokio::test]
    async fn read_current_queries_and_parses()
    {
        let (io_handle, mut peer) = tokio::io::duplex(128);
        let mut smu = SourceMeter::with(io_handle);

        // pre-buffer the reply; the query is consumed afterwards
        peer.write_all(b"+0.000000E+00,-1.234500E-03,+9.910000E+37\n").await.unwrap();

        let amps = smu.read_current().await.unwrap();
        assert!((amps - (-1.2345e-3)).abs() < 1e-18);
        assert_eq!(drain(&mut peer).await, ":READ?\n");
    }

    #[tokio::test]
    async fn read_current_reports_malformed_replies()
    {
        let (io_handle, mut peer) = tokio::io::duplex(128);
        let mut smu = SourceMeter::with(io_handle);

        peer.write_all(b"nonsense\n").await.unwrap();

        match smu.read_current().await {
            Err(ReadError::Reply(format_err)) => assert_eq!(format_err.raw_reply, "nonsense"),
            other => panic!("expected a reply format error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn relay_select_frames_and_settles()
    {
        let (io_handle, mut peer) = tokio::io::duplex(64);
        let mut relay = RelayBank::with(io_handle);

        let selected_at = std::time::Instant::now();
        relay.select(3, true).await.unwrap();
        assert!(selected_at.elapsed() >= super::RELAY_SETTLE);

        assert_eq!(drain(&mut peer).await, "3 1\n");
    }

    #[tokio::test]
    async fn disconnected_handles_refuse_commands()
    {
        let (relay_io, _relay_peer) = tokio::io::duplex(64);
        let mut relay = RelayBank::with(relay_io);
        assert!(relay.disconnect().is_some());
        assert!(!relay.is_connected());

        match relay.select(0, true).await {
            Err(DeviceError::NotConnected) => {}
            other => panic!("expected NotConnected, got {:?}", other),
        }

        let (smu_io, _smu_peer) = tokio::io::duplex(64);
        let mut smu = SourceMeter::with(smu_io);
        assert!(smu.disconnect().is_some());

        match smu.set_voltage(0.5).await {
            Err(DeviceError::NotConnected) => {}
            other => panic!("expected NotConnected, got {:?}", other),
        }
    }
}
