use ads1299::SampleRate;

/// Single-byte commands on the control channel.
///
/// | bits 7..0                     | command                              |
/// |-------------------------------|--------------------------------------|
/// | `0x00`                        | impedance check                      |
/// | `0b0_00x_iii_l`, non-zero     | sample rate index `iii`, low-latency `l` |
/// | `0bx_01x_xggg`                | gain code `ggg`                      |
/// | anything else                 | ignored                              |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    SetSampleRate { rate: SampleRate, low_latency: bool },
    /// Raw 3-bit gain field, applied to every channel.
    SetGain(u8),
    ImpedanceCheck,
}

pub const IMPEDANCE_CHECK: u8 = 0x00;

const CLASS_MASK: u8 = 0x60;
const RATE_CLASS: u8 = 0x00;
const GAIN_CLASS: u8 = 0x40;
const RESERVED: u8 = 0x80;
const LOW_LATENCY: u8 = 0x01;

impl ControlCommand {
    /// `None` for unrecognised bytes, including rate index 7.
    pub const fn decode(byte: u8) -> Option<Self> {
        if byte == IMPEDANCE_CHECK {
            return Some(Self::ImpedanceCheck);
        }
        match byte & CLASS_MASK {
            GAIN_CLASS => Some(Self::SetGain(byte & 0b111)),
            RATE_CLASS if byte & RESERVED == 0 => {
                match SampleRate::from_index((byte >> 1) & 0b111) {
                    Some(rate) => Some(Self::SetSampleRate {
                        rate,
                        low_latency: byte & LOW_LATENCY != 0,
                    }),
                    None => None,
                }
            }
            _ => None,
        }
    }

    pub const fn encode(self) -> u8 {
        match self {
            Self::ImpedanceCheck => IMPEDANCE_CHECK,
            Self::SetGain(code) => GAIN_CLASS | (code & 0b111),
            Self::SetSampleRate { rate, low_latency } => {
                RATE_CLASS | (rate.index() << 1) | low_latency as u8
            }
        }
    }
}

impl TryFrom<u8> for ControlCommand {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::decode(value).ok_or("Unrecognized control command")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_commands() {
        for index in 0..7u8 {
            for low_latency in [false, true] {
                let byte = (index << 1) | low_latency as u8;
                if byte == 0 {
                    continue;
                }
                let cmd = ControlCommand::decode(byte).unwrap();
                assert_eq!(
                    cmd,
                    ControlCommand::SetSampleRate {
                        rate: SampleRate::from_index(index).unwrap(),
                        low_latency,
                    }
                );
                assert_eq!(cmd.encode(), byte);
            }
        }
        // Bit 4 is not part of the rate field.
        assert_eq!(
            ControlCommand::decode(0x12),
            Some(ControlCommand::SetSampleRate {
                rate: SampleRate::Sps500,
                low_latency: false
            })
        );
    }

    #[test]
    fn rate_index_seven_is_ignored() {
        assert_eq!(ControlCommand::decode(0x0E), None);
        assert_eq!(ControlCommand::decode(0x0F), None);
    }

    #[test]
    fn gain_commands() {
        for code in 0..8u8 {
            assert_eq!(
                ControlCommand::decode(0x40 | code),
                Some(ControlCommand::SetGain(code))
            );
            assert_eq!(ControlCommand::SetGain(code).encode(), 0x40 | code);
        }
        assert_eq!(ControlCommand::decode(0x5B), Some(ControlCommand::SetGain(3)));
        assert_eq!(ControlCommand::decode(0xC1), Some(ControlCommand::SetGain(1)));
    }

    #[test]
    fn impedance_and_ignored() {
        assert_eq!(
            ControlCommand::decode(0x00),
            Some(ControlCommand::ImpedanceCheck)
        );
        for byte in [0x20, 0x3F, 0x60, 0x7F, 0x80, 0x85, 0xA0, 0xFF] {
            assert_eq!(ControlCommand::decode(byte), None, "{byte:#04x}");
        }
        assert!(ControlCommand::try_from(0x80).is_err());
    }
}
