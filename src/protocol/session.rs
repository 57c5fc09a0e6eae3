//! Inbound palette download: begin / entry / end state machine.

use log::{debug, trace, warn};

use super::{SysexCommand, SysexConfig};
use crate::color::Rgb;
use crate::palette::{Palette, PaletteStore, PALETTE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No begin marker seen since the last commit.
    Idle,
    /// Accumulating entries into the scratch palette.
    Receiving,
}

/// What a single inbound frame did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysexOutcome {
    /// Not a palette frame, too short, or an entry outside a transfer.
    Ignored,
    /// Begin marker: scratch palette reset.
    Started,
    /// Entry stored in the scratch palette.
    Entry { index: usize, color: Rgb },
    /// End marker: the received palette, ready to commit.
    Completed(Palette),
}

/// Transfer state for one device.
///
/// A begin marker always discards whatever was received before it. An end
/// marker commits the scratch palette even when it is empty, so an end
/// without a begin replaces the store with an empty palette.
#[derive(Debug, Clone)]
pub struct TransferSession {
    config: SysexConfig,
    state: SessionState,
    scratch: Palette,
}

impl TransferSession {
    pub fn new(config: SysexConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            scratch: Palette::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Entries received so far in the current transfer.
    pub fn received(&self) -> &Palette {
        &self.scratch
    }

    pub fn config(&self) -> &SysexConfig {
        &self.config
    }

    /// Drop any partial transfer and return to idle.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.scratch.clear();
    }

    /// Interpret one inbound sysex frame.
    pub fn feed(&mut self, data: &[u8]) -> SysexOutcome {
        let offset = self.config.command_offset();

        if !self.config.accepts_prefix(data) {
            trace!("ignoring sysex with foreign header ({} bytes)", data.len());
            return SysexOutcome::Ignored;
        }

        let Some(&byte) = data.get(offset) else {
            trace!("ignoring short sysex ({} bytes)", data.len());
            return SysexOutcome::Ignored;
        };

        let command = match SysexCommand::try_from(byte) {
            Ok(command) => command,
            Err(other) => {
                trace!("ignoring sysex command {other}");
                return SysexOutcome::Ignored;
            }
        };

        let payload = &data[offset + 1..];
        if payload.len() < command.payload_len() {
            trace!("ignoring truncated {command:?} frame");
            return SysexOutcome::Ignored;
        }

        match command {
            SysexCommand::Begin => {
                if self.state == SessionState::Receiving {
                    debug!(
                        "palette transfer restarted, discarding {} entries",
                        self.scratch.len()
                    );
                } else {
                    debug!("palette transfer started");
                }
                self.scratch.clear();
                self.state = SessionState::Receiving;
                SysexOutcome::Started
            }
            SysexCommand::Entry => {
                if self.state != SessionState::Receiving {
                    trace!("ignoring palette entry outside a transfer");
                    return SysexOutcome::Ignored;
                }

                let index = payload[0] as usize;
                if index >= PALETTE_SIZE {
                    warn!("ignoring palette entry with index {index}");
                    return SysexOutcome::Ignored;
                }

                let color = Rgb::new(payload[1], payload[2], payload[3]);
                match self.scratch.insert(index, color) {
                    Ok(()) => SysexOutcome::Entry { index, color },
                    Err(_) => SysexOutcome::Ignored,
                }
            }
            SysexCommand::End => {
                let received = std::mem::take(&mut self.scratch);
                debug!("palette transfer complete with {} entries", received.len());
                self.state = SessionState::Idle;
                SysexOutcome::Completed(received)
            }
        }
    }

    /// Interpret a frame and commit a completed transfer into `store`.
    pub fn handle(&mut self, data: &[u8], store: &PaletteStore) -> SysexOutcome {
        let outcome = self.feed(data);
        if let SysexOutcome::Completed(palette) = &outcome {
            store.replace_all(palette.clone());
        }
        outcome
    }
}

impl Default for TransferSession {
    fn default() -> Self {
        Self::new(SysexConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 7] = [0xF0, 0x00, 0x20, 0x29, 0x02, 0x10, 0x7F];

    fn frame(command: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = HEADER.to_vec();
        data.push(command);
        data.extend_from_slice(payload);
        data.push(0xF7);
        data
    }

    fn begin() -> Vec<u8> {
        frame(123, &[])
    }

    fn entry(index: u8, r: u8, g: u8, b: u8) -> Vec<u8> {
        frame(35, &[index, r, g, b])
    }

    fn end() -> Vec<u8> {
        frame(125, &[])
    }

    #[test]
    fn test_later_entry_overwrites() {
        let mut session = TransferSession::default();
        let store = PaletteStore::new();

        for data in [begin(), entry(5, 10, 20, 30), entry(5, 40, 50, 60), end()] {
            session.handle(&data, &store);
        }

        assert_eq!(store.get(5), Some(Rgb::new(40, 50, 60)));
        assert_eq!(store.palette().len(), 1);
        assert!(store.is_dirty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_entry_without_begin_is_dropped() {
        let mut session = TransferSession::default();
        let store = PaletteStore::with_default_palette();

        assert_eq!(
            session.handle(&entry(5, 1, 2, 3), &store),
            SysexOutcome::Ignored
        );
        assert!(store.palette().is_full());
        assert!(!store.is_dirty());

        // End with nothing received still commits, wiping the store.
        assert_eq!(
            session.handle(&end(), &store),
            SysexOutcome::Completed(Palette::new())
        );
        assert!(store.palette().is_empty());
        assert!(store.is_dirty());
    }

    #[test]
    fn test_begin_discards_partial_transfer() {
        let mut session = TransferSession::default();
        let store = PaletteStore::new();

        session.handle(&begin(), &store);
        session.handle(&entry(1, 1, 1, 1), &store);
        session.handle(&begin(), &store);
        session.handle(&entry(2, 2, 2, 2), &store);
        session.handle(&end(), &store);

        assert_eq!(store.get(1), None);
        assert_eq!(store.get(2), Some(Rgb::new(2, 2, 2)));
    }

    #[test]
    fn test_noise_does_not_abort_transfer() {
        let mut session = TransferSession::default();
        let store = PaletteStore::new();

        session.handle(&begin(), &store);
        session.handle(&entry(9, 9, 9, 9), &store);

        for noise in [
            vec![],
            vec![0xF0, 0xF7],
            frame(0x42, &[1, 2, 3, 4]),
            frame(35, &[1, 2]),
            entry(200, 1, 1, 1),
        ] {
            assert_eq!(session.feed(&noise), SysexOutcome::Ignored);
        }
        assert_eq!(session.state(), SessionState::Receiving);

        session.handle(&end(), &store);
        assert_eq!(store.get(9), Some(Rgb::new(9, 9, 9)));
        assert_eq!(store.palette().len(), 1);
    }

    #[test]
    fn test_minimum_frame_lengths() {
        let mut session = TransferSession::default();

        // Exactly long enough: no terminator byte.
        assert_eq!(session.feed(&[0, 0, 0, 0, 0, 0, 0, 123]), SysexOutcome::Started);
        assert_eq!(
            session.feed(&[0, 0, 0, 0, 0, 0, 0, 35, 4, 1, 2, 3]),
            SysexOutcome::Entry {
                index: 4,
                color: Rgb::new(1, 2, 3)
            }
        );
        assert_eq!(
            session.feed(&[0, 0, 0, 0, 0, 0, 0, 35, 4, 1, 2]),
            SysexOutcome::Ignored
        );
        assert_eq!(session.feed(&[0, 0, 0, 0, 0, 0, 0]), SysexOutcome::Ignored);
    }

    #[test]
    fn test_header_matching() {
        let mut session = TransferSession::new(SysexConfig {
            match_header: true,
            ..Default::default()
        });

        let mut foreign = begin();
        foreign[5] = 0x18;
        assert_eq!(session.feed(&foreign), SysexOutcome::Ignored);
        assert_eq!(session.feed(&begin()), SysexOutcome::Started);
    }

    #[test]
    fn test_reset() {
        let mut session = TransferSession::default();
        session.feed(&begin());
        session.feed(&entry(3, 3, 3, 3));
        assert_eq!(session.received().len(), 1);

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.received().is_empty());
    }
}
