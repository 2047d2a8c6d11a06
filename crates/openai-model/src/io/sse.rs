use super::{Chunks, ChunksError};

#[derive(Debug)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads server-sent events from a chunk stream.
///
/// Only the `data` field is collected. Comments and other fields are
/// skipped, and an event without data is never dispatched. Bytes are
/// buffered until a whole line is available, so multi-byte characters may
/// be split across chunks.
pub struct Sse {
    buf: Vec<u8>,
    data: Option<String>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            data: None,
            chunks,
            exhausted: false,
        }
    }

    /// Returns the data of the next event, or `None` at the end of stream.
    ///
    /// A trailing event that is not terminated by a blank line is dropped.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            while let Some(line) = self.take_line()? {
                if let Some(event) = self.process_line(&line) {
                    return Ok(Some(event));
                }
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::Chunks)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.exhausted = true,
            }
        }
    }

    fn take_line(&mut self) -> Result<Option<String>, Error> {
        let Some(eol_idx) = self.buf.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let mut line = self.buf.drain(..=eol_idx).collect::<Vec<_>>();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line)
            .map(Some)
            .map_err(|_| Error::InvalidPayload)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.data.take();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => {
                (field, value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };
        if field == "data" {
            match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_owned()),
            }
        }
        None
    }
}
