//! Streaming reader over a file of concatenated WWIVnet packets.
//!
//! Never loads the whole file; each step reads one header, its list and its
//! payload. Tolerant of damaged tails: a packet cut short by the end of the
//! file ends the sequence (with a warning) instead of failing, matching how
//! network files from remote systems have always been processed.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{NetError, Result};
use crate::packet::net_packet::{read_wwivnet_packet, NetPacket, ReadNetPacketResponse};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Forward-only, single-pass sequence of the packets in one file.
///
/// Open a new `NetMailFile` on the same path to scan again from the start.
pub struct NetMailFile {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    done: bool,
    truncated: bool,
}

impl NetMailFile {
    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| NetError::open(&path, e))?;
        debug!(path = %path.display(), "Opened WWIVnet packet file");
        Ok(Self {
            path,
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            offset: 0,
            done: false,
            truncated: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next packet.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether iteration stopped on an incomplete packet.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Read the next packet.
    ///
    /// `Ok(None)` marks the end of the sequence, including a truncated tail.
    /// Only real I/O failures are errors.
    pub fn next_packet(&mut self) -> Result<Option<NetPacket>> {
        if self.done {
            return Ok(None);
        }
        let response = read_wwivnet_packet(&mut self.reader).map_err(|e| match e {
            NetError::Io { source, .. } => NetError::io(&self.path, source),
            other => other,
        });
        match response {
            Ok(ReadNetPacketResponse::Packet(packet)) => {
                self.offset += packet.encoded_len() as u64;
                Ok(Some(packet))
            }
            Ok(ReadNetPacketResponse::EndOfFile) => {
                self.done = true;
                Ok(None)
            }
            Ok(ReadNetPacketResponse::Truncated { needed, available }) => {
                warn!(
                    path = %self.path.display(),
                    offset = self.offset,
                    needed,
                    available,
                    "Truncated packet at end of file, stopping"
                );
                self.done = true;
                self.truncated = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }
}

impl Iterator for NetMailFile {
    type Item = NetPacket;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Error reading packet file, stopping");
                None
            }
        }
    }
}

impl std::iter::FusedIterator for NetMailFile {}
