use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use serde::Serialize;
use tracing::{trace, warn};
use triomphe::Arc;

use crate::error::{BodyError, HttpError};

use super::OpenMode;

/// The resource behind a [`Stream`], handed out by [`Stream::detach`].
#[derive(Debug)]
pub enum Resource {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

impl Resource {
    fn len(&self) -> io::Result<u64> {
        match self {
            Resource::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            Resource::File(file) => file.metadata().map(|metadata| metadata.len()),
        }
    }
}

impl Read for Resource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Resource::Memory(cursor) => cursor.read(buf),
            Resource::File(file) => file.read(buf),
        }
    }
}

impl Write for Resource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Resource::Memory(cursor) => cursor.write(buf),
            Resource::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Resource::Memory(cursor) => cursor.flush(),
            Resource::File(file) => file.flush(),
        }
    }
}

impl Seek for Resource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Resource::Memory(cursor) => cursor.seek(pos),
            Resource::File(file) => file.seek(pos),
        }
    }
}

/// Stream metadata, see [`Stream::metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMetadata {
    /// `memory` or `file`
    pub stream_type: &'static str,
    pub mode: String,
    pub seekable: bool,
    pub eof: bool,
    /// the path a file stream was opened from, if known
    pub uri: Option<String>,
}

struct State {
    resource: Resource,
    eof: bool,
}

struct Shared {
    state: Mutex<Option<State>>,
    mode: OpenMode,
    seekable: bool,
    uri: Option<String>,
}

/// A byte stream used as a message body.
///
/// `Stream` is a handle: clones refer to the same underlying resource, which is what lets
/// a message be copied by its `with_*` methods without copying the body. Capabilities are
/// computed once from the open mode and cached.
///
/// The resource is released when the last handle is dropped, or eagerly by
/// [`close`](Stream::close) and [`detach`](Stream::detach). A closed or detached stream
/// stays unusable: reads, writes, seeks and `tell` fail from then on.
///
/// # Example
///
/// ```
/// use micro_message::body::Stream;
///
/// let body = Stream::from("hello world");
/// assert_eq!(&body.read(5).unwrap()[..], b"hello");
/// assert_eq!(body.to_string(), "hello world");
///
/// body.close();
/// assert!(body.read(1).is_err());
/// ```
#[derive(Clone)]
pub struct Stream {
    shared: Arc<Shared>,
}

impl Stream {
    /// An empty, readable and writable in-memory stream.
    pub fn empty() -> Self {
        Self::memory(Vec::new())
    }

    fn memory(bytes: Vec<u8>) -> Self {
        Self::from_parts(Resource::Memory(Cursor::new(bytes)), OpenMode::READ_WRITE, true, None)
    }

    fn from_parts(resource: Resource, mode: OpenMode, seekable: bool, uri: Option<String>) -> Self {
        let state = State { resource, eof: false };
        Self { shared: Arc::new(Shared { state: Mutex::new(Some(state)), mode, seekable, uri }) }
    }

    /// Opens the file at `path` with an `fopen` style mode such as `"r"` or `"w+"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode is invalid or the file can not be opened.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, HttpError> {
        let mode: OpenMode = mode.parse()?;
        let path = path.as_ref();
        let file = mode.open_options().open(path).map_err(BodyError::io)?;
        trace!(path = %path.display(), %mode, "opened file stream");
        Ok(Self::from_file(file, mode, Some(path.display().to_string())))
    }

    /// Wraps an already opened file. `mode` must describe how the file was opened.
    pub fn from_file(file: File, mode: OpenMode, uri: Option<String>) -> Self {
        let seekable = file.metadata().is_ok_and(|metadata| metadata.is_file());
        Self::from_parts(Resource::File(file), mode, seekable, uri)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<State>>, BodyError> {
        self.shared.state.lock().map_err(|_| BodyError::io(io::Error::other("stream lock poisoned")))
    }

    fn attached(&self) -> bool {
        self.lock().is_ok_and(|state| state.is_some())
    }

    pub fn is_readable(&self) -> bool {
        self.shared.mode.is_readable() && self.attached()
    }

    pub fn is_writable(&self) -> bool {
        self.shared.mode.is_writable() && self.attached()
    }

    pub fn is_seekable(&self) -> bool {
        self.shared.seekable && self.attached()
    }

    /// Reads up to `length` bytes. Fewer bytes are returned when the stream ends first.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::NotReadable`] if the stream is write-only, closed or detached.
    pub fn read(&self, length: usize) -> Result<Bytes, BodyError> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BodyError::NotReadable)?;
        if !self.shared.mode.is_readable() {
            return Err(BodyError::NotReadable);
        }

        let mut buf = Vec::with_capacity(length.min(64 * 1024));
        let read = (&mut state.resource).take(length as u64).read_to_end(&mut buf)?;
        if read < length {
            state.eof = true;
        }
        Ok(Bytes::from(buf))
    }

    /// Writes all of `data` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::NotWritable`] if the stream is read-only, closed or detached.
    pub fn write(&self, data: &[u8]) -> Result<usize, BodyError> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BodyError::NotWritable)?;
        if !self.shared.mode.is_writable() {
            return Err(BodyError::NotWritable);
        }

        state.resource.write_all(data)?;
        state.eof = false;
        Ok(data.len())
    }

    /// Moves the read/write position and returns the new position.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Detached`] after close or detach, [`BodyError::NotSeekable`] for
    /// streams that can not seek, or an io error for an invalid position.
    pub fn seek(&self, position: SeekFrom) -> Result<u64, BodyError> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BodyError::Detached)?;
        if !self.shared.seekable {
            return Err(BodyError::NotSeekable);
        }

        let offset = state.resource.seek(position)?;
        state.eof = false;
        Ok(offset)
    }

    /// Seeks to the beginning of the stream.
    ///
    /// # Errors
    ///
    /// Same as [`seek`](Stream::seek).
    pub fn rewind(&self) -> Result<(), BodyError> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Returns the current position.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Detached`] after close or detach.
    pub fn tell(&self) -> Result<u64, BodyError> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BodyError::Detached)?;
        Ok(state.resource.stream_position()?)
    }

    /// Returns true once a read has hit the end of the stream. A closed or detached stream
    /// is always at its end.
    pub fn eof(&self) -> bool {
        self.lock().map_or(true, |guard| guard.as_ref().is_none_or(|state| state.eof))
    }

    /// Returns the size in bytes if known.
    pub fn size(&self) -> Option<u64> {
        let guard = self.lock().ok()?;
        guard.as_ref().and_then(|state| state.resource.len().ok())
    }

    /// Reads the rest of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Detached`] after close or detach and [`BodyError::NotReadable`]
    /// for write-only streams.
    pub fn contents(&self) -> Result<Bytes, BodyError> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BodyError::Detached)?;
        if !self.shared.mode.is_readable() {
            return Err(BodyError::NotReadable);
        }

        let mut buf = Vec::new();
        state.resource.read_to_end(&mut buf)?;
        state.eof = true;
        Ok(Bytes::from(buf))
    }

    /// Closes the stream and releases the underlying resource.
    pub fn close(&self) {
        if let Some(mut resource) = self.detach() {
            if let Err(e) = resource.flush() {
                warn!(cause = %e, "failed to flush stream on close");
            }
        }
    }

    /// Separates the underlying resource from the stream, leaving the stream unusable.
    ///
    /// Returns `None` if the stream was already closed or detached.
    pub fn detach(&self) -> Option<Resource> {
        let mut guard = self.lock().ok()?;
        guard.take().map(|state| state.resource)
    }

    /// Returns the stream metadata, or `None` once the stream is closed or detached.
    pub fn metadata(&self) -> Option<StreamMetadata> {
        let guard = self.lock().ok()?;
        let state = guard.as_ref()?;
        let stream_type = match state.resource {
            Resource::Memory(_) => "memory",
            Resource::File(_) => "file",
        };

        Some(StreamMetadata {
            stream_type,
            mode: self.shared.mode.to_string(),
            seekable: self.shared.seekable,
            eof: state.eof,
            uri: self.shared.uri.clone(),
        })
    }

    /// Returns a single metadata entry by its key, e.g. `"mode"` or `"seekable"`.
    pub fn metadata_value(&self, key: &str) -> Option<serde_json::Value> {
        let metadata = serde_json::to_value(self.metadata()?).ok()?;
        metadata.get(key).filter(|value| !value.is_null()).cloned()
    }

    /// Returns true if both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn read_all(&self) -> Result<Bytes, BodyError> {
        if self.is_seekable() {
            self.rewind()?;
        }
        self.contents()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for Stream {
    fn from(bytes: Vec<u8>) -> Self {
        Self::memory(bytes)
    }
}

impl From<Bytes> for Stream {
    fn from(bytes: Bytes) -> Self {
        Self::memory(bytes.into())
    }
}

impl From<String> for Stream {
    fn from(value: String) -> Self {
        Self::memory(value.into_bytes())
    }
}

impl From<&str> for Stream {
    fn from(value: &str) -> Self {
        Self::memory(value.as_bytes().to_vec())
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Stream {}

/// Rewinds when possible and reads the whole stream. Never fails: errors produce an
/// empty string.
impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.read_all() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!(cause = %e, "failed to read stream contents");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("mode", &self.shared.mode.to_string())
            .field("seekable", &self.shared.seekable)
            .field("attached", &self.attached())
            .finish_non_exhaustive()
    }
}
