use std::io::BufRead;

use bytes::Bytes;
use serde_json::de::IoRead;
use serde_json::{StreamDeserializer, Value};

use blockfs_types::{BlockHash, BlockRef, ByteRange, Delimiter};

use crate::error::{ChunkError, ChunkResult};
use crate::hasher::BlockHasher;

/// One finalized chunk: content bytes paired with their identity.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub hash: BlockHash,
    pub data: Bytes,
}

impl Chunk {
    /// Reference covering this chunk's full content, `[0, len)`.
    pub fn block_ref(&self) -> BlockRef {
        BlockRef::new(self.hash, ByteRange::new(0, self.data.len() as u64))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Delimiter-specific cutting state.
///
/// The JSON decoder persists across chunk boundaries: it may buffer bytes
/// past the value it just produced, so rebuilding it per chunk would lose
/// input.
enum Cutter<R: BufRead> {
    Line(R),
    Json(StreamDeserializer<'static, IoRead<R>, Value>),
}

/// Splits one streamed byte sequence into content-addressed chunks.
///
/// A lazy, finite, non-restartable iterator of `(hash, bytes)` pairs. Units
/// (lines or JSON values) accumulate into the current chunk until its length
/// strictly exceeds `min_block_size`; end-of-input finalizes whatever has
/// accumulated. Empty input yields no chunks at all — there is never a
/// trailing zero-length chunk.
pub struct Splitter<R: BufRead> {
    cutter: Cutter<R>,
    min_block_size: usize,
    finished: bool,
}

impl<R: BufRead> Splitter<R> {
    pub fn new(reader: R, delimiter: Delimiter, min_block_size: usize) -> Self {
        let cutter = match delimiter {
            Delimiter::Line => Cutter::Line(reader),
            Delimiter::Json => {
                Cutter::Json(serde_json::Deserializer::from_reader(reader).into_iter())
            }
        };
        Self {
            cutter,
            min_block_size,
            finished: false,
        }
    }

    fn next_chunk(&mut self) -> ChunkResult<Option<Chunk>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut hasher = BlockHasher::new();

        match &mut self.cutter {
            Cutter::Line(reader) => loop {
                let start = buffer.len();
                let n = reader.read_until(b'\n', &mut buffer)?;
                if n == 0 {
                    self.finished = true;
                    break;
                }
                hasher.update(&buffer[start..]);
                if buffer.len() > self.min_block_size {
                    break;
                }
            },
            Cutter::Json(values) => loop {
                match values.next() {
                    None => {
                        self.finished = true;
                        break;
                    }
                    Some(Err(e)) if e.is_io() => return Err(ChunkError::Io(e.into())),
                    Some(Err(e)) => return Err(ChunkError::MalformedRecord(e.to_string())),
                    Some(Ok(value)) => {
                        // Canonical re-encoding: the stored bytes are the
                        // compact form, not whatever whitespace arrived.
                        let encoded = serde_json::to_vec(&value)
                            .map_err(|e| ChunkError::MalformedRecord(e.to_string()))?;
                        hasher.update(&encoded);
                        buffer.extend_from_slice(&encoded);
                        if buffer.len() > self.min_block_size {
                            break;
                        }
                    }
                }
            },
        }

        if buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(Chunk {
            hash: hasher.finalize(),
            data: Bytes::from(buffer),
        }))
    }
}

impl<R: BufRead> Iterator for Splitter<R> {
    type Item = ChunkResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
