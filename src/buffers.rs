//! Constants for buffer sizes.
//!
//! This is kind of awkward, but marginally better than writing `1024` everywhere?

/// The default capacity (in bytes) of the scratch buffer used when draining a child's output
/// stream.
///
/// This should be large enough to accomodate most read chunks without resizing the buffer.
pub const READ_BUFFER_CAPACITY: usize = 1024;

/// The default capacity (in bytes) of the buffer accumulating a partial NUL-delimited record.
pub const RECORD_BUFFER_CAPACITY: usize = 256;
