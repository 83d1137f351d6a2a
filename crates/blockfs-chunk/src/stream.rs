use std::io::{self, Read};

use bytes::{Buf, Bytes};

/// Inbound half of the stream adapter: a pull-based chunk feed.
///
/// The transport delivers a put operation's bytes as a sequence of chunks;
/// implementations surface exactly two outcomes per pull — "more bytes"
/// (`Ok(Some)`) or clean end-of-input (`Ok(None)`). Transport framing never
/// reaches the splitter. Any `Err` fails the whole put operation.
pub trait ChunkSource {
    /// Block until the next chunk arrives, or until end-of-input.
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        (**self).next_chunk()
    }
}

/// Single-buffer source: yields its buffer once, then end-of-input.
///
/// Useful for tests and for callers that already hold the full payload.
pub struct BufferSource {
    buffer: Option<Bytes>,
}

impl BufferSource {
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        Self {
            buffer: Some(buffer.into()),
        }
    }

    /// A source that is at end-of-input from the first pull.
    pub fn empty() -> Self {
        Self { buffer: None }
    }
}

impl ChunkSource for BufferSource {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        Ok(self.buffer.take().filter(|b| !b.is_empty()))
    }
}

/// Chunk source fed by a transport task through a bounded tokio channel.
///
/// The receiving side bridges into the synchronous splitter via
/// `blocking_recv`, so pulls must happen on a blocking-capable thread
/// (e.g. `tokio::task::spawn_blocking`), never inside an async task.
/// A closed channel is clean end-of-input; a transport read failure is
/// delivered in-band as an `Err` item.
pub struct ChannelChunkSource {
    rx: tokio::sync::mpsc::Receiver<io::Result<Bytes>>,
}

impl ChannelChunkSource {
    pub fn new(rx: tokio::sync::mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self { rx }
    }
}

impl ChunkSource for ChannelChunkSource {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        match self.rx.blocking_recv() {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Exhaust whatever input remains so the transport can close cleanly.
///
/// Called after a put operation finishes, successfully or not. Stops on the
/// first error as well as on end-of-input.
pub fn drain<S: ChunkSource>(source: &mut S) {
    loop {
        match source.next_chunk() {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
}

/// Bridges a [`ChunkSource`] to the buffered byte reader the splitter pulls
/// from. When the internal buffer runs dry, exactly one more chunk is
/// requested; end-of-input surfaces as a clean zero-length read.
pub struct StreamReader<S> {
    source: S,
    buffer: Bytes,
    done: bool,
}

impl<S: ChunkSource> StreamReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: Bytes::new(),
            done: false,
        }
    }
}

impl<S: ChunkSource> Read for StreamReader<S> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.buffer.is_empty() {
            if self.done {
                return Ok(0);
            }
            match self.source.next_chunk()? {
                Some(chunk) => self.buffer = chunk,
                None => {
                    self.done = true;
                    return Ok(0);
                }
            }
        }
        let n = out.len().min(self.buffer.len());
        out[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.advance(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds a fixed list of chunks and counts how many pulls were made.
    struct CountingSource {
        chunks: Vec<Bytes>,
        pulls: usize,
    }

    impl CountingSource {
        fn new(chunks: Vec<&'static [u8]>) -> Self {
            Self {
                chunks: chunks.into_iter().map(Bytes::from_static).collect(),
                pulls: 0,
            }
        }
    }

    impl ChunkSource for CountingSource {
        fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
            self.pulls += 1;
            if self.chunks.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.chunks.remove(0)))
            }
        }
    }

    #[test]
    fn reader_concatenates_chunks() {
        let source = CountingSource::new(vec![b"hel", b"lo ", b"world"]);
        let mut reader = StreamReader::new(source);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn reader_pulls_one_chunk_per_refill() {
        let source = CountingSource::new(vec![b"aaaa", b"bbbb"]);
        let mut reader = StreamReader::new(source);
        let mut buf = [0u8; 2];

        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.source.pulls, 1);
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.source.pulls, 1);
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.source.pulls, 2);
    }

    #[test]
    fn end_of_input_is_clean_eof() {
        let mut reader = StreamReader::new(BufferSource::empty());
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        // EOF is sticky.
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn source_error_propagates() {
        struct FailingSource;
        impl ChunkSource for FailingSource {
            fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer gone"))
            }
        }
        let mut reader = StreamReader::new(FailingSource);
        let mut buf = [0u8; 8];
        assert_eq!(
            reader.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::ConnectionReset
        );
    }

    #[test]
    fn drain_exhausts_remaining_chunks() {
        let mut source = CountingSource::new(vec![b"a", b"b", b"c"]);
        drain(&mut source);
        assert!(source.chunks.is_empty());
        // Three chunks plus the end-of-input pull.
        assert_eq!(source.pulls, 4);
    }

    #[test]
    fn channel_source_delivers_chunks_then_eof() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.try_send(Ok(Bytes::from_static(b"one"))).unwrap();
        tx.try_send(Ok(Bytes::from_static(b"two"))).unwrap();
        drop(tx);

        let mut source = ChannelChunkSource::new(rx);
        assert_eq!(source.next_chunk().unwrap().unwrap(), &b"one"[..]);
        assert_eq!(source.next_chunk().unwrap().unwrap(), &b"two"[..]);
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn channel_source_surfaces_transport_error() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.try_send(Err(io::Error::new(io::ErrorKind::BrokenPipe, "reset")))
            .unwrap();
        drop(tx);

        let mut source = ChannelChunkSource::new(rx);
        assert_eq!(
            source.next_chunk().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
