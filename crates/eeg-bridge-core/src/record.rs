use ads1299::Frame;

/// One captured conversion. Built once by the capture stage and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleRecord {
    timestamp_us: u64,
    sequence: u32,
    frame: Frame,
}

impl SampleRecord {
    pub fn new(timestamp_us: u64, sequence: u32, frame: Frame) -> Self {
        Self { timestamp_us, sequence, frame }
    }

    /// Capture time, taken on the data-ready edge before the bus read.
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Bytes as they go on the wire: status word, then the samples.
    pub fn payload(&self) -> &[u8] {
        self.frame.as_bytes()
    }
}
