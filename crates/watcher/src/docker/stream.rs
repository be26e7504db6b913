use bytes::{Buf, BytesMut};

use crate::docker::event::Event;

// Initial buffer size; a typical engine event is a few hundred bytes.
const INITIAL_CAPACITY: usize = 4 * 1024;

/// Incremental decoder for a body of concatenated JSON objects.
///
/// The daemon writes one object per event but HTTP chunking gives no
/// guarantee that a frame holds exactly one, so bytes are buffered until
/// a whole value is available.
pub struct EventDecoder {
    buf: BytesMut,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append a body frame.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Decode the next complete event, if the buffer holds one.
    ///
    /// `Ok(None)` means more input is needed. An error means the buffered
    /// bytes can never become a valid event.
    pub fn next_event(&mut self) -> Result<Option<Event>, serde_json::Error> {
        self.skip_whitespace();
        if self.buf.is_empty() {
            return Ok(None);
        }

        let (next, consumed) = {
            let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Event>();
            let next = values.next();
            (next, values.byte_offset())
        };

        match next {
            Some(Ok(event)) => {
                self.buf.advance(consumed);
                Ok(Some(event))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Called at end of input. Anything left besides whitespace is a
    /// value the daemon never finished writing; the byte count is returned.
    pub fn finish(&mut self) -> Result<(), usize> {
        self.skip_whitespace();
        match self.buf.len() {
            0 => Ok(()),
            n => Err(n),
        }
    }

    fn skip_whitespace(&mut self) {
        let start = self
            .buf
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.buf.len());
        self.buf.advance(start);
    }
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}
