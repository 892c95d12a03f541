use heapless::Vec;
use serde::{Deserialize, Serialize};

pub const RESPONSE_OK: &str = "Ok";
pub const RESPONSE_ERROR: &str = "Error";
pub const RESPONSE_NOT_IMPLEMENTED: &str = "Not Implemented";
pub const RESPONSE_NO_ACTIVE_CHANNELS: &str = "No Active Channels";

pub const MAX_REPLY_LEN: usize = 384;
pub type ReplyBuf = Vec<u8, MAX_REPLY_LEN>;

/// Named commands of the JSON control surface,
/// `{"command": "<name>", "parameters": [p0, p1]}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextCommand {
    Nop,
    Micros,
    Version,
    Status,
    SerialNumber,
    LedOn,
    LedOff,
    BoardLedOn,
    BoardLedOff,
    Wakeup,
    Standby,
    Reset,
    Start,
    Stop,
    Rdatac,
    Sdatac,
    Rreg { register: u8 },
    Wreg { register: u8, value: u8 },
    Help,
    Unknown,
}

/// Names accepted by [`TextCommand::parse`], in `help` order.
pub const COMMAND_NAMES: [&str; 19] = [
    "nop",
    "micros",
    "version",
    "status",
    "serialnumber",
    "ledon",
    "ledoff",
    "boardledon",
    "boardledoff",
    "wakeup",
    "standby",
    "reset",
    "start",
    "stop",
    "rdatac",
    "sdatac",
    "rreg",
    "wreg",
    "help",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextError {
    /// Not JSON, or missing the `command` field.
    Malformed,
    /// Parameter does not fit in a byte.
    ParameterRange,
    /// Reply did not fit in [`MAX_REPLY_LEN`].
    ReplyTooLong,
}

#[derive(Deserialize)]
struct Request<'a> {
    command: &'a str,
    #[serde(default)]
    parameters: Vec<u16, 4>,
}

impl TextCommand {
    pub fn parse(message: &[u8]) -> Result<Self, TextError> {
        let (request, _) = serde_json_core::from_slice::<Request<'_>>(message)
            .map_err(|_| TextError::Malformed)?;
        // Absent parameters read as 0.
        let param = |i: usize| -> Result<u8, TextError> {
            let value = request.parameters.get(i).copied().unwrap_or(0);
            u8::try_from(value).map_err(|_| TextError::ParameterRange)
        };

        let command = match request.command {
            "nop" => Self::Nop,
            "micros" => Self::Micros,
            "version" => Self::Version,
            "status" => Self::Status,
            "serialnumber" => Self::SerialNumber,
            "ledon" => Self::LedOn,
            "ledoff" => Self::LedOff,
            "boardledon" => Self::BoardLedOn,
            "boardledoff" => Self::BoardLedOff,
            "wakeup" => Self::Wakeup,
            "standby" => Self::Standby,
            "reset" => Self::Reset,
            "start" => Self::Start,
            "stop" => Self::Stop,
            "rdatac" => Self::Rdatac,
            "sdatac" => Self::Sdatac,
            "rreg" => Self::Rreg { register: param(0)? },
            "wreg" => Self::Wreg { register: param(0)?, value: param(1)? },
            "help" => Self::Help,
            _ => Self::Unknown,
        };
        Ok(command)
    }
}

#[derive(Serialize)]
struct Response<T> {
    response: T,
}

/// Body of the `status` reply. Serialized as a bare object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport<'a> {
    pub driver_version: &'a str,
    pub board_name: &'a str,
    pub maker_name: &'a str,
    pub hardware_type: &'a str,
    pub max_channels: u8,
    pub active_channels: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextReply<'a> {
    Ok,
    Error,
    NotImplemented,
    NoActiveChannels,
    Version(&'a str),
    Number(u64),
    Status(StatusReport<'a>),
    Help,
}

impl TextReply<'_> {
    pub fn encode(&self) -> Result<ReplyBuf, TextError> {
        let encoded = match self {
            TextReply::Ok => to_vec(&Response { response: RESPONSE_OK }),
            TextReply::Error => to_vec(&Response { response: RESPONSE_ERROR }),
            TextReply::NotImplemented => {
                to_vec(&Response { response: RESPONSE_NOT_IMPLEMENTED })
            }
            TextReply::NoActiveChannels => {
                to_vec(&Response { response: RESPONSE_NO_ACTIVE_CHANNELS })
            }
            TextReply::Version(version) => to_vec(&Response { response: version }),
            TextReply::Number(n) => to_vec(&Response { response: n }),
            TextReply::Status(status) => to_vec(status),
            TextReply::Help => to_vec(&Response { response: &COMMAND_NAMES[..] }),
        };
        encoded.map_err(|_| TextError::ReplyTooLong)
    }
}

fn to_vec<T: Serialize + ?Sized>(
    value: &T,
) -> serde_json_core::ser::Result<ReplyBuf> {
    serde_json_core::to_vec(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_str(reply: TextReply<'_>) -> ReplyBuf {
        reply.encode().unwrap()
    }

    #[test]
    fn parses_every_name() {
        for name in COMMAND_NAMES {
            let mut msg: Vec<u8, 96> = Vec::new();
            msg.extend_from_slice(br#"{"command":""#).unwrap();
            msg.extend_from_slice(name.as_bytes()).unwrap();
            msg.extend_from_slice(br#"","parameters":[1,2]}"#).unwrap();
            let cmd = TextCommand::parse(&msg).unwrap();
            assert_ne!(cmd, TextCommand::Unknown, "{name}");
        }
    }

    #[test]
    fn register_parameters() {
        assert_eq!(
            TextCommand::parse(br#"{"command":"wreg","parameters":[5,96]}"#),
            Ok(TextCommand::Wreg { register: 5, value: 96 })
        );
        assert_eq!(
            TextCommand::parse(br#"{"parameters":[1],"command":"rreg"}"#),
            Ok(TextCommand::Rreg { register: 1 })
        );
        assert_eq!(
            TextCommand::parse(br#"{"command":"rreg"}"#),
            Ok(TextCommand::Rreg { register: 0 })
        );
        assert_eq!(
            TextCommand::parse(br#"{"command":"wreg","parameters":[5]}"#),
            Ok(TextCommand::Wreg { register: 5, value: 0 })
        );
        assert_eq!(
            TextCommand::parse(br#"{"command":"wreg","parameters":[5,300]}"#),
            Err(TextError::ParameterRange)
        );
    }

    #[test]
    fn unknown_and_malformed() {
        assert_eq!(
            TextCommand::parse(br#"{"command":"selfdestruct"}"#),
            Ok(TextCommand::Unknown)
        );
        assert_eq!(TextCommand::parse(b"nop"), Err(TextError::Malformed));
    }

    #[test]
    fn replies() {
        assert_eq!(&reply_str(TextReply::Ok)[..], br#"{"response":"Ok"}"#);
        assert_eq!(
            &reply_str(TextReply::NoActiveChannels)[..],
            br#"{"response":"No Active Channels"}"#
        );
        assert_eq!(
            &reply_str(TextReply::Number(123456))[..],
            br#"{"response":123456}"#
        );
        assert_eq!(
            &reply_str(TextReply::Version("v0.0.1"))[..],
            br#"{"response":"v0.0.1"}"#
        );
        let help = reply_str(TextReply::Help);
        assert!(help.starts_with(br#"{"response":["nop","micros""#));
    }

    #[test]
    fn status_reply() {
        let status = TextReply::Status(StatusReport {
            driver_version: "v0.0.1",
            board_name: "eeg-bridge",
            maker_name: "maker",
            hardware_type: "ADS1299",
            max_channels: 8,
            active_channels: 3,
        });
        assert_eq!(
            &reply_str(status)[..],
            br#"{"driver_version":"v0.0.1","board_name":"eeg-bridge","maker_name":"maker","hardware_type":"ADS1299","max_channels":8,"active_channels":3}"#
        );
    }
}
