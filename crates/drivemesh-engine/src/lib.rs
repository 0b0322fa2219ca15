//! Object Engine: places, fetches, lists, and removes object bytes across
//! the account pool the Load Balancer selects from, plus the Multipart
//! Session for client-driven chunked uploads.

pub mod chunk_reader;
pub mod multipart;
pub mod object_engine;
pub mod seekable;

#[cfg(test)]
mod test_support;

pub use chunk_reader::ChunkReader;
pub use multipart::{MultipartSession, UploadId};
pub use object_engine::{ObjectEngine, ObjectPage};
pub use seekable::{BufferedBody, SeekableRead};
