//! A minimal seekable-reader abstraction shared by whole-object reads and
//! [`crate::chunk_reader::ChunkReader`].
//!
//! This is the engine's `ReadSeekCloser`: an HTTP range-serving layer can
//! drive either implementation identically — seek to the requested start,
//! read until the requested length or EOF.

use async_trait::async_trait;

#[async_trait]
pub trait SeekableRead: Send {
    /// Reads up to `buf.len()` bytes, returning the number read. Returns
    /// `Ok(0)` at EOF.
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Seeks to an absolute byte offset from the start of the object.
    async fn seek(&mut self, offset: u64) -> std::io::Result<()>;

    /// Total length of the underlying object.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A whole object already held in memory (non-chunked `Remote` or `Local`
/// placements, which the engine fetches/reads in full up front).
pub struct BufferedBody {
    data: Vec<u8>,
    position: usize,
}

impl BufferedBody {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }
}

#[async_trait]
impl SeekableRead for BufferedBody {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }

    async fn seek(&mut self, offset: u64) -> std::io::Result<()> {
        self.position = (offset as usize).min(self.data.len());
        Ok(())
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_full_buffer_in_one_call() {
        let mut body = BufferedBody::new(b"hello world".to_vec());
        let mut buf = [0u8; 32];
        let n = body.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello world");
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn seek_repositions_subsequent_reads() {
        let mut body = BufferedBody::new(b"0123456789".to_vec());
        body.seek(5).await.unwrap();
        let mut buf = [0u8; 2];
        let n = body.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"56");
    }

    #[tokio::test]
    async fn seek_past_end_reads_nothing() {
        let mut body = BufferedBody::new(b"abc".to_vec());
        body.seek(100).await.unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }
}
