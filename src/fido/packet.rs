//! Reading and writing FidoNet packet files.
//!
//! A packet is a [`FidoPacketHeader`] followed by packed messages and a
//! two-byte zero terminator. Unlike WWIVnet files, a damaged record puts the
//! reader in a permanent error state: nothing after a bad record is trusted.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{NetError, Result};
use crate::fido::header::{FidoPacketHeader, FIDO_HEADER_SIZE};
use crate::fido::message::FidoPackedMessage;

/// Where a [`FidoPacket`] reader stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FidoPacketState {
    /// More records may follow.
    Open,
    /// The terminator or the end of the file was reached.
    EndOfFile,
    /// A record was truncated or malformed.
    Error,
}

/// Sequential reader over one FidoNet packet file.
pub struct FidoPacket {
    path: PathBuf,
    reader: BufReader<File>,
    header: FidoPacketHeader,
    state: FidoPacketState,
    offset: u64,
}

impl FidoPacket {
    /// Open `path` and read its packet header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| NetError::open(&path, e))?;
        let len = file.metadata().map_err(|e| NetError::io(&path, e))?.len();
        if len < FIDO_HEADER_SIZE as u64 {
            return Err(NetError::Truncated {
                offset: 0,
                needed: FIDO_HEADER_SIZE as u64,
                available: len,
            });
        }
        let mut reader = BufReader::new(file);
        let header = FidoPacketHeader::decode(&mut reader).map_err(|e| NetError::io(&path, e))?;
        debug!(
            path = %path.display(),
            orig = %header.orig_address(),
            dest = %header.dest_address(),
            "Opened FidoNet packet"
        );
        Ok(Self {
            path,
            reader,
            header,
            state: FidoPacketState::Open,
            offset: FIDO_HEADER_SIZE as u64,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &FidoPacketHeader {
        &self.header
    }

    pub fn state(&self) -> FidoPacketState {
        self.state
    }

    /// Read the next message.
    ///
    /// `Ok(None)` once the packet is exhausted, on this and every later
    /// call. After an error every later call fails with
    /// [`NetError::ReaderFailed`].
    pub fn read(&mut self) -> Result<Option<FidoPackedMessage>> {
        match self.state {
            FidoPacketState::EndOfFile => return Ok(None),
            FidoPacketState::Error => return Err(NetError::ReaderFailed),
            FidoPacketState::Open => {}
        }
        match FidoPackedMessage::read(&mut self.reader, &mut self.offset) {
            Ok(Some(msg)) => Ok(Some(msg)),
            Ok(None) => {
                debug!(path = %self.path.display(), offset = self.offset, "End of FidoNet packet");
                self.state = FidoPacketState::EndOfFile;
                Ok(None)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Bad record in FidoNet packet");
                self.state = FidoPacketState::Error;
                Err(match e {
                    NetError::Io { source, .. } => NetError::io(&self.path, source),
                    other => other,
                })
            }
        }
    }
}

/// Yields each message, then stops; an error is yielded once before stopping.
impl Iterator for FidoPacket {
    type Item = Result<FidoPackedMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != FidoPacketState::Open {
            return None;
        }
        self.read().transpose()
    }
}

/// Writes a FidoNet packet file.
pub struct FidoPacketWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
}

impl FidoPacketWriter {
    /// Create `path` (failing if it exists) and write `header`.
    pub fn create(path: impl AsRef<Path>, header: &FidoPacketHeader) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| NetError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        header
            .encode(&mut writer)
            .map_err(|e| NetError::io(&path, e))?;
        Ok(Self {
            path,
            writer,
            count: 0,
        })
    }

    pub fn write_message(&mut self, msg: &FidoPackedMessage) -> Result<()> {
        msg.encode(&mut self.writer)
            .map_err(|e| NetError::io(&self.path, e))?;
        self.count += 1;
        Ok(())
    }

    /// Write the terminator and flush. Returns the number of messages written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .write_u16::<LittleEndian>(0)
            .and_then(|()| self.writer.flush())
            .map_err(|e| NetError::io(&self.path, e))?;
        debug!(path = %self.path.display(), messages = self.count, "Wrote FidoNet packet");
        Ok(self.count)
    }
}
