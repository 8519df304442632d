//! Seekable stream over one object.

use ra_error::{RaError, Result};
use ra_logical::LogicalIo;
use ra_telemetry::{Operation, Telemetry, names};
use ra_types::{ObjectFormat, ObjectUri};
use std::io::SeekFrom;
use tracing::debug;

/// A read cursor over one object.
///
/// The cursor is owned by the stream; positioned and tail reads leave it
/// untouched. After [`SeekableStream::close`] every call except `close`
/// fails with [`RaError::Closed`].
pub struct SeekableStream {
    uri: ObjectUri,
    logical: Box<dyn LogicalIo>,
    telemetry: Telemetry,
    position: u64,
    closed: bool,
}

impl SeekableStream {
    pub(crate) fn new(uri: ObjectUri, logical: Box<dyn LogicalIo>, telemetry: Telemetry) -> Self {
        Self {
            uri,
            logical,
            telemetry,
            position: 0,
            closed: false,
        }
    }

    /// The object this stream reads.
    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    /// The read strategy chosen for the object.
    pub fn format(&self) -> ObjectFormat {
        self.logical.format()
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Object size in bytes.
    pub async fn len(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.logical.metadata().await?.size)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Move the cursor and return the new position.
    ///
    /// Seeking past the end is allowed; reads there return end of object.
    /// Only [`SeekFrom::End`] needs the object size.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.len().await?.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(RaError::InvalidArgument(format!(
                "cannot seek to {:?} from position {} of {}",
                pos, self.position, self.uri
            )));
        };
        self.position = target;
        Ok(target)
    }

    /// Read one byte at the cursor. `None` at end of object.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        self.ensure_open()?;
        if self.position >= self.len().await? {
            return Ok(None);
        }
        let operation = self.read_operation(names::STREAM_READ, self.position, 1);
        let byte = self
            .telemetry
            .measure(operation, self.logical.read_byte(self.position))
            .await?;
        self.position += 1;
        Ok(Some(byte))
    }

    /// Read into `buf` at the cursor and advance it. Returns 0 at end of object.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self.read_at(self.position, buf).await?;
        self.position += read as u64;
        Ok(read)
    }

    /// Read into `buf` at `pos` without moving the cursor. Returns 0 at or
    /// past end of object.
    pub async fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() || pos >= self.len().await? {
            return Ok(0);
        }
        let operation = self.read_operation(names::STREAM_READ, pos, buf.len());
        self.telemetry
            .measure(operation, self.logical.read(buf, pos))
            .await
    }

    /// Read the last `buf.len()` bytes of the object without moving the cursor.
    pub async fn read_tail(&self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        let operation = Operation::new(names::STREAM_READ_TAIL)
            .with_attribute("uri", &self.uri)
            .with_attribute("len", buf.len());
        self.telemetry
            .measure(operation, self.logical.read_tail(buf))
            .await
    }

    /// Wait for the prefetch tasks this stream has spawned so far.
    pub async fn wait_for_prefetches(&self) {
        self.logical.wait_for_prefetches().await;
    }

    /// Close the stream. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.logical.close();
        debug!(uri = %self.uri, position = self.position, "Stream closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RaError::Closed(format!("stream for {} is closed", self.uri)));
        }
        Ok(())
    }

    fn read_operation(&self, name: &'static str, pos: u64, len: usize) -> Operation {
        Operation::new(name)
            .with_attribute("uri", &self.uri)
            .with_attribute("pos", pos)
            .with_attribute("len", len)
    }
}

impl Drop for SeekableStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SeekableStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeekableStream")
            .field("uri", &self.uri)
            .field("format", &self.format())
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish()
    }
}
