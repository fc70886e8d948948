//! Low-level byte reading utilities.

use std::io::{self, Read};

/// Read until `buf` is full or the stream ends. Returns the number of
/// bytes actually read.
///
/// Unlike `read_exact`, end-of-stream before the buffer fills is not an
/// error here: the interleaver treats a short sector read as the normal
/// end-of-volume condition, so the caller decides what a partial fill
/// means.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
