//! Device command definition and serialization

use std::fmt;

/// Current compliance limit programmed on every instrument reset, in amperes
pub const COMPLIANCE_AMPS: f64 = 0.10;

/// Commands understood by the source-measurement unit
///
/// Every variant serializes to one SCPI-style ASCII line. The instrument
/// acknowledges nothing; the only command with a reply is the measurement
/// query.
#[derive(Clone)]
pub enum SmuCmd
{
    /// Full instrument reset
    ///
    /// Command: `*RST`
    Reset,
    /// Route sourcing and sensing to the rear terminal block
    ///
    /// Command: `:ROUT:TERM REAR`
    RearTerminals,
    /// Source voltage at the output terminal
    ///
    /// Command: `:SOUR:FUNC VOLT`
    SourceFunctionVolts,
    /// Sense current at the measurement input
    ///
    /// Command: `:SENS:FUNC 'CURR'`
    SenseFunctionAmps,
    /// Limit the sourced current to the given number of amperes
    ///
    /// Command: `:SENS:CURR:PROT <amps>`
    CurrentProtection(f64),
    /// Switch the source output on or off
    ///
    /// Command: `:OUTP ON|OFF`
    Output(bool),
    /// Present the given voltage at the source terminal
    ///
    /// Command: `:SOUR:VOLT <volts>`
    SourceVolts(f64),
    /// Drive the auxiliary TTL output line high or low
    ///
    /// The solar-simulator shutter hangs off this line; see
    /// [`SourceMeter::set_illumination`](crate::devices::SourceMeter::set_illumination)
    /// for the polarity.
    ///
    /// Command: `:SOUR2:TTL 1|0`
    AuxTtl(bool),
    /// Trigger one measurement and return the reading record
    ///
    /// Command: `:READ?`, replied to with a comma-delimited line
    Read,
}

impl fmt::Display for SmuCmd
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            SmuCmd::Reset => write!(f, "*RST"),
            SmuCmd::RearTerminals => write!(f, ":ROUT:TERM REAR"),
            SmuCmd::SourceFunctionVolts => write!(f, ":SOUR:FUNC VOLT"),
            SmuCmd::SenseFunctionAmps => write!(f, ":SENS:FUNC 'CURR'"),
            SmuCmd::CurrentProtection(amps) => write!(f, ":SENS:CURR:PROT {:.2}", amps),
            SmuCmd::Output(on) => write!(f, ":OUTP {}", if *on { "ON" } else { "OFF" }),
            SmuCmd::SourceVolts(volts) => write!(f, ":SOUR:VOLT {}", volts),
            SmuCmd::AuxTtl(high) => write!(f, ":SOUR2:TTL {}", if *high { '1' } else { '0' }),
            SmuCmd::Read => write!(f, ":READ?"),
        }
    }
}

/// Pixel-select command for the relay bank
///
/// Command: `<channel> <1|0>` where the channel is a zero-based relay index
#[derive(Clone, Copy)]
pub struct RelayCmd
{
    pub channel: u8,
    pub energize: bool,
}

impl fmt::Display for RelayCmd
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} {}", self.channel, if self.energize { '1' } else { '0' })
    }
}

#[cfg(test)]
mod tests
{
    use super::{ RelayCmd, SmuCmd, COMPLIANCE_AMPS };

    #[test]
    fn serialize_smu_setup()
    {
        assert_eq!(&format!("{}", SmuCmd::Reset), "*RST");
        assert_eq!(&format!("{}", SmuCmd::RearTerminals), ":ROUT:TERM REAR");
        assert_eq!(&format!("{}", SmuCmd::SourceFunctionVolts), ":SOUR:FUNC VOLT");
        assert_eq!(&format!("{}", SmuCmd::SenseFunctionAmps), ":SENS:FUNC 'CURR'");
        assert_eq!(&format!("{}", SmuCmd::CurrentProtection(COMPLIANCE_AMPS)), ":SENS:CURR:PROT 0.10");
    }

    #[test]
    fn serialize_smu_sweep()
    {
        assert_eq!(&format!("{}", SmuCmd::Output(true)), ":OUTP ON");
        assert_eq!(&format!("{}", SmuCmd::Output(false)), ":OUTP OFF");
        assert_eq!(&format!("{}", SmuCmd::SourceVolts(-0.1)), ":SOUR:VOLT -0.1");
        assert_eq!(&format!("{}", SmuCmd::SourceVolts(1.15)), ":SOUR:VOLT 1.15");
        assert_eq!(&format!("{}", SmuCmd::AuxTtl(false)), ":SOUR2:TTL 0");
        assert_eq!(&format!("{}", SmuCmd::AuxTtl(true)), ":SOUR2:TTL 1");
        assert_eq!(&format!("{}", SmuCmd::Read), ":READ?");
    }

    #[test]
    fn serialize_relay_select()
    {
        assert_eq!(&format!("{}", RelayCmd { channel: 0, energize: true }), "0 1");
        assert_eq!(&format!("{}", RelayCmd { channel: 3, energize: false }), "3 0");
        assert_eq!(&format!("{}", RelayCmd { channel: 7, energize: true }), "7 1");
    }
}
