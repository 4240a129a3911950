//! Whole-file content comparison.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Compare two files byte for byte.
pub fn files_equal(a: &Path, b: &Path) -> io::Result<bool> {
    let file_a = File::open(a)?;
    let file_b = File::open(b)?;

    if file_a.metadata()?.len() != file_b.metadata()?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::with_capacity(CHUNK_SIZE, file_a);
    let mut reader_b = BufReader::with_capacity(CHUNK_SIZE, file_b);
    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let read = read_full(&mut reader_a, &mut buf_a)?;
        if read_full(&mut reader_b, &mut buf_b[..read])? != read {
            return Ok(false);
        }
        if read == 0 {
            return Ok(true);
        }
        if buf_a[..read] != buf_b[..read] {
            return Ok(false);
        }
    }
}

/// Fill `buf` as far as the reader allows, returning bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_equal_and_different() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let c = temp.path().join("c");
        fs::write(&a, "same content").unwrap();
        fs::write(&b, "same content").unwrap();
        fs::write(&c, "same c0ntent").unwrap();

        assert!(files_equal(&a, &b).unwrap());
        assert!(!files_equal(&a, &c).unwrap());
    }

    #[test]
    fn test_length_mismatch() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, "short").unwrap();
        fs::write(&b, "longer").unwrap();

        assert!(!files_equal(&a, &b).unwrap());
    }

    #[test]
    fn test_multi_chunk() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let mut data = vec![7u8; CHUNK_SIZE * 2 + 10];
        fs::write(&a, &data).unwrap();
        *data.last_mut().unwrap() = 8;
        fs::write(&b, &data).unwrap();

        assert!(!files_equal(&a, &b).unwrap());
        assert!(files_equal(&a, &a).unwrap());
    }
}
