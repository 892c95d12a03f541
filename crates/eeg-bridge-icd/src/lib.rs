//! Wire formats shared by the firmware and its host-side clients.
//!
//! Inbound: single control bytes ([`ControlCommand`]) and JSON text
//! commands ([`TextCommand`]). Outbound: sample packets (see [`packet`]) and
//! JSON replies ([`TextReply`]).
#![no_std]

mod control;
pub use control::*;

mod framing;
pub use framing::{FrameChunker, FrameKind};

pub mod packet;
pub use packet::{block_count, block_len, packet_len};

mod text;
pub use text::*;

pub use ads1299::SampleRate;

/// Reported by the `version` and `status` text commands.
pub const DRIVER_VERSION: &str = "v0.0.1";

/// Inbound message classification: a lone byte is a control command,
/// anything longer is a text command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    Control(Option<ControlCommand>),
    Text(Result<TextCommand, TextError>),
}

impl Inbound {
    pub fn classify(message: &[u8]) -> Option<Self> {
        match message {
            [] => None,
            [byte] => Some(Inbound::Control(ControlCommand::decode(*byte))),
            text => Some(Inbound::Text(TextCommand::parse(text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_messages() {
        assert_eq!(Inbound::classify(&[]), None);
        assert_eq!(
            Inbound::classify(&[0x00]),
            Some(Inbound::Control(Some(ControlCommand::ImpedanceCheck)))
        );
        assert_eq!(
            Inbound::classify(br#"{"command":"nop"}"#),
            Some(Inbound::Text(Ok(TextCommand::Nop)))
        );
        assert_eq!(
            Inbound::classify(b"{}"),
            Some(Inbound::Text(Err(TextError::Malformed)))
        );
    }
}
