//! Message bodies.
//!
//! A [`Stream`] wraps an in-memory buffer or a file. See [`OpenMode`] for the modes a
//! file stream can be opened with.

mod mode;
mod stream;

pub use mode::OpenMode;
pub use stream::Resource;
pub use stream::Stream;
pub use stream::StreamMetadata;
