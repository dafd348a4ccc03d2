use crate::error::{FfmErr, Result};

/// Reads fixed width, big-endian values from a borrowed buffer.
///
/// Running out of bytes is a `MalformedLayout` error, never a panic.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Takes the next `N` bytes.
    ///
    /// # Returns
    /// The bytes or `MalformedLayout` if fewer than `N` are left.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;

        let Some(bytes) = self.buf.get(self.pos..end) else {
            return Err(FfmErr::malformed(format!(
                "truncated input: needed {N} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        };

        self.pos = end;

        let mut out = [0; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.take::<1>()?;
        Ok(byte)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take().map(u32::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take().map(i32::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.take().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.take().map(f64::from_be_bytes)
    }

    /// The amount of bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
