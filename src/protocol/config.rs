//! Sysex framing configuration.

/// Framing used for palette sysex traffic.
///
/// The command byte sits right after `header`, so the header length is the
/// command offset for both directions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SysexConfig {
    /// Prefix of every outbound message (SysEx start, manufacturer, device).
    pub header: Vec<u8>,
    /// Ignore inbound frames whose prefix differs from `header`.
    pub match_header: bool,
    /// Command byte of the palette upload message.
    pub upload_command: u8,
    /// Trailing byte of outbound messages.
    pub terminator: u8,
}

impl Default for SysexConfig {
    fn default() -> Self {
        Self {
            // F0, Novation (00 20 29), Launchpad Pro (02 10), custom firmware
            header: vec![0xF0, 0x00, 0x20, 0x29, 0x02, 0x10, 0x7F],
            match_header: false,
            upload_command: 0x3D,
            terminator: 0xF7,
        }
    }
}

impl SysexConfig {
    /// Offset of the command byte within a frame.
    #[inline]
    pub fn command_offset(&self) -> usize {
        self.header.len()
    }

    /// Whether an inbound frame passes the optional header check.
    pub fn accepts_prefix(&self, data: &[u8]) -> bool {
        !self.match_header || data.starts_with(&self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SysexConfig::default();
        assert_eq!(config.command_offset(), 7);
        assert!(!config.match_header);
        assert!(config.accepts_prefix(&[0xF0, 0x01]));
    }

    #[test]
    fn test_header_matching() {
        let config = SysexConfig {
            match_header: true,
            ..Default::default()
        };
        assert!(config.accepts_prefix(&[0xF0, 0x00, 0x20, 0x29, 0x02, 0x10, 0x7F, 123]));
        assert!(!config.accepts_prefix(&[0xF0, 0x00, 0x20, 0x29, 0x02, 0x18, 0x7F, 123]));
    }
}
