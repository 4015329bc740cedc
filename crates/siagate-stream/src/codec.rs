//! Streaming change codec.
//!
//! A change stream is a plain concatenation of CBOR items, one per
//! [`ConsensusChange`]. Each item is self-delimiting, so a reader can decode
//! changes as they arrive without any framing.

use bytes::Bytes;
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use siagate_consensus::ConsensusChange;

use crate::error::{Result, StreamError};

/// Writes changes to a connection.
pub struct ChangeEncoder<W> {
    writer: W,
    flush_each_change: bool,
    buf: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> ChangeEncoder<W> {
    pub fn new(writer: W, flush_each_change: bool) -> Self {
        Self {
            writer,
            flush_each_change,
            buf: Vec::new(),
        }
    }

    /// Encode and write one change.
    pub async fn encode(&mut self, change: &ConsensusChange) -> Result<()> {
        self.buf.clear();
        ciborium::into_writer(change, &mut self.buf)
            .map_err(|e| StreamError::Encoding(e.to_string()))?;
        self.writer.write_all(&self.buf).await?;
        if self.flush_each_change {
            self.writer.flush().await?;
        }
        Ok(())
    }

    /// Flush and shut down the writer.
    pub async fn close(mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Reads changes back out of a raw stream.
pub struct ChangeDecoder {
    data: Bytes,
    pos: usize,
}

impl ChangeDecoder {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Read `reader` to the end and decode from the collected bytes.
    pub async fn from_reader<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(Self::new(data))
    }

    /// The next change, or `None` at a clean end of stream.
    pub fn next_change(&mut self) -> Result<Option<ConsensusChange>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let mut cursor = Cursor::new(&self.data[self.pos..]);
        let change: ConsensusChange = ciborium::from_reader(&mut cursor)
            .map_err(|e| StreamError::Decoding(e.to_string()))?;
        self.pos += cursor.position() as usize;
        Ok(Some(change))
    }

    /// Decode every change up to the end of the data or the first error.
    ///
    /// Changes decoded before an error are kept.
    pub fn decode_all(mut self) -> (Vec<ConsensusChange>, Option<StreamError>) {
        let mut changes = Vec::new();
        loop {
            match self.next_change() {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => return (changes, None),
                Err(e) => return (changes, Some(e)),
            }
        }
    }
}

impl Iterator for ChangeDecoder {
    type Item = Result<ConsensusChange>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_change() {
            Ok(Some(change)) => Some(Ok(change)),
            Ok(None) => None,
            Err(e) => {
                // stop after the first error
                self.pos = self.data.len();
                Some(Err(e))
            }
        }
    }
}
