//! Message framing on a packet-oriented link such as USB CDC.
//!
//! A message is a one-byte [`FrameKind`] followed by its payload, cut into
//! packets of the link's maximum size. The last packet is short; when the
//! message fills its packets exactly, an empty packet ends it.

/// Frame kinds on a message-oriented link. Values match WebSocket opcodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Text = 0x01,
    Binary = 0x02,
}

impl TryFrom<u8> for FrameKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(FrameKind::Text),
            0x02 => Ok(FrameKind::Binary),
            other => Err(other),
        }
    }
}

/// Cuts one message into link packets.
pub struct FrameChunker<'a> {
    header: Option<u8>,
    rest: &'a [u8],
    finished: bool,
}

impl<'a> FrameChunker<'a> {
    pub fn new(kind: FrameKind, payload: &'a [u8]) -> Self {
        Self { header: Some(kind as u8), rest: payload, finished: false }
    }

    /// Fills `packet` with the next packet and returns its length, or
    /// `None` once the terminating short packet has been produced.
    pub fn next_packet(&mut self, packet: &mut [u8]) -> Option<usize> {
        if self.finished || packet.is_empty() {
            return None;
        }
        let mut len = 0;
        if let Some(kind) = self.header.take() {
            packet[0] = kind;
            len = 1;
        }
        let take = (packet.len() - len).min(self.rest.len());
        packet[len..len + take].copy_from_slice(&self.rest[..take]);
        self.rest = &self.rest[take..];
        len += take;
        if len < packet.len() {
            self.finished = true;
        }
        Some(len)
    }
}
