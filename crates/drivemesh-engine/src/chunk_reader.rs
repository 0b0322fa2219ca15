//! Lazy, seekable reader over a striped object's chunks.
//!
//! Holds bounded memory per active chunk and drops its buffer on seek
//! past it, the same windowed-buffer discipline a hydration manager
//! applies to on-demand file content, but without any inode, watch
//! channel, or on-disk cache plumbing — this reader only ever holds one
//! chunk's bytes in memory at a time.

use std::sync::Arc;

use async_trait::async_trait;
use drivemesh_core::domain::{Chunk, Placement};
use drivemesh_core::ports::{BackendClient, ByteRange};
use drivemesh_core::usecases::AccountRegistry;

use crate::seekable::SeekableRead;

/// Reads a striped object's chunks in order, fetching each chunk's bytes
/// from its own backend account on demand.
pub struct ChunkReader {
    backend: Arc<dyn BackendClient>,
    registry: Arc<AccountRegistry>,
    /// Chunks sorted by `chunk_index`.
    chunks: Vec<Chunk>,
    /// Prefix sum of chunk lengths; `offsets[i]` is the starting byte of
    /// `chunks[i]`, `offsets[len]` is the total size.
    offsets: Vec<u64>,
    total_size: u64,
    position: u64,
    /// The currently buffered chunk: its index into `chunks` and its bytes.
    current: Option<(usize, Vec<u8>)>,
}

impl ChunkReader {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        registry: Arc<AccountRegistry>,
        mut chunks: Vec<Chunk>,
    ) -> Self {
        chunks.sort_by_key(|c| c.chunk_index());

        let mut offsets = Vec::with_capacity(chunks.len() + 1);
        let mut running = 0u64;
        offsets.push(0);
        for chunk in &chunks {
            running += chunk.length();
            offsets.push(running);
        }
        let total_size = running;

        Self {
            backend,
            registry,
            chunks,
            offsets,
            total_size,
            position: 0,
            current: None,
        }
    }

    /// `chunkIndex = offset / chunkSize` generalized to uneven trailing
    /// chunks: binary search the prefix-sum table instead of dividing by
    /// a nominal chunk size.
    fn locate(&self, offset: u64) -> Option<(usize, u64)> {
        if offset >= self.total_size {
            return None;
        }
        let idx = match self.offsets.binary_search(&offset) {
            Ok(i) => i.min(self.chunks.len() - 1),
            Err(i) => i - 1,
        };
        let intra = offset - self.offsets[idx];
        Some((idx, intra))
    }

    async fn load_chunk(&mut self, idx: usize) -> std::io::Result<()> {
        if let Some((current_idx, _)) = &self.current {
            if *current_idx == idx {
                return Ok(());
            }
        }

        let chunk = &self.chunks[idx];
        let account_id = match chunk.placement() {
            Placement::Remote { account_id, .. } => *account_id,
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "chunk has no remote placement",
                ))
            }
        };
        let remote_id = match chunk.placement() {
            Placement::Remote { remote_id, .. } => remote_id.as_str().to_string(),
            _ => unreachable!(),
        };

        let account = self.registry.ensure_valid(&account_id).await.map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, format!("token refresh failed: {e}"))
        })?;
        let token = account
            .access_token()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "account has no access token"))?
            .to_string();

        let bytes = self
            .backend
            .download(&token, &remote_id, None::<ByteRange>)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

        self.current = Some((idx, bytes));
        Ok(())
    }
}

#[async_trait]
impl SeekableRead for ChunkReader {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.position >= self.total_size {
            return Ok(0);
        }

        // Fill `buf` from as many consecutive chunks as needed so a read
        // spanning a chunk boundary is transparent to the caller; only one
        // chunk's bytes are ever resident at a time.
        let mut filled = 0;
        while filled < buf.len() && self.position < self.total_size {
            let Some((idx, intra)) = self.locate(self.position) else {
                break;
            };
            self.load_chunk(idx).await?;

            let (_, data) = self.current.as_ref().expect("just loaded");
            let available = &data[intra as usize..];
            let n = available.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&available[..n]);
            filled += n;
            self.position += n as u64;

            if intra as usize + n >= data.len() {
                self.current = None;
            }
        }

        Ok(filled)
    }

    async fn seek(&mut self, offset: u64) -> std::io::Result<()> {
        self.position = offset.min(self.total_size);
        // A seek invalidates the current buffer unless it still covers
        // the new position; `load_chunk` re-checks on the next read, so
        // just drop it defensively to bound memory on large forward seeks.
        if let Some((idx, _)) = &self.current {
            if self.locate(self.position).map(|(i, _)| i) != Some(*idx) {
                self.current = None;
            }
        }
        Ok(())
    }

    fn len(&self) -> u64 {
        self.total_size
    }
}
