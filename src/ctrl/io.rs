// CLASSIFICATION: COMMUNITY
// Filename: io.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Exact-length transfers over stream sockets.
//!
//! A stream socket may accept or deliver fewer bytes than asked for on any
//! call, so fixed-size frames are rebuilt by looping until the whole buffer
//! has moved.

use std::io::{self, ErrorKind, Read, Write};

/// Write all of `buf` to `w`.
///
/// Partial writes are continued and `Interrupted` is retried. A write that
/// accepts nothing is reported as `WriteZero`; broken pipes and other
/// failures are returned as-is. On success the result equals `buf.len()`.
pub fn sendn<W: Write + ?Sized>(w: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut sent = 0;
    while sent < buf.len() {
        match w.write(&buf[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("peer accepted {} of {} bytes", sent, buf.len()),
                ))
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(sent)
}

/// Fill `buf` from `r`.
///
/// Returns the number of bytes read. A count below `buf.len()` means the
/// peer shut down cleanly first; `Ok(0)` means it was gone before the first
/// byte. Errors other than `Interrupted` are returned.
pub fn readn<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(got)
}

/// Read and throw away `len` bytes using a fixed scratch buffer.
///
/// Returns the number of bytes discarded, short if the peer closed.
pub(crate) fn discard<R: Read + ?Sized>(r: &mut R, len: usize) -> io::Result<usize> {
    let mut scratch = [0u8; 4096];
    let mut left = len;
    while left > 0 {
        let chunk = left.min(scratch.len());
        let n = readn(r, &mut scratch[..chunk])?;
        left -= n;
        if n < chunk {
            break;
        }
    }
    Ok(len - left)
}
