//! Palette transfer command bytes.

/// Command byte found at the command offset of a palette sysex frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysexCommand {
    /// Entry frame: `[index, r, g, b]` follows (35, `#`)
    Entry = 35,
    /// Begin-transfer marker (123, `{`)
    Begin = 123,
    /// End-transfer marker (125, `}`)
    End = 125,
}

impl SysexCommand {
    /// Bytes the command needs after the command byte itself.
    pub fn payload_len(self) -> usize {
        match self {
            SysexCommand::Entry => 4,
            SysexCommand::Begin | SysexCommand::End => 0,
        }
    }
}

impl TryFrom<u8> for SysexCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            35 => Ok(SysexCommand::Entry),
            123 => Ok(SysexCommand::Begin),
            125 => Ok(SysexCommand::End),
            _ => Err(value),
        }
    }
}
