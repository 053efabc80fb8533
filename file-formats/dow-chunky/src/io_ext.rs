//! Extension traits for little-endian reads and writes.
//!
//! All multi-byte values in a Relic Chunky container are little-endian.
//! Strings inside chunk payloads are written as an `i32` byte length
//! followed by UTF-8 data with no terminator.

use std::io::{self, Read, Write};

/// Little-endian read helpers for chunk payloads
pub trait ReadExt: Read {
    /// Read a single byte
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian u16
    fn read_u16_le(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a little-endian u32
    fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a little-endian i32
    fn read_i32_le(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read a little-endian f32
    fn read_f32_le(&mut self) -> io::Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Read exactly `len` bytes into a new buffer
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a length-prefixed string
    fn read_string(&mut self) -> io::Result<String> {
        let len = self.read_i32_le()?;
        if len < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("negative string length {len}"),
            ));
        }
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "string is not valid UTF-8"))
    }

    /// Skip `len` bytes by reading and discarding them
    fn skip_bytes(&mut self, len: u64) -> io::Result<()> {
        let copied = io::copy(&mut self.take(len), &mut io::sink())?;
        if copied < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended while skipping",
            ));
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

/// Little-endian write helpers for chunk payloads
pub trait WriteExt: Write {
    /// Write a single byte
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_all(&[value])
    }

    /// Write a little-endian u16
    fn write_u16_le(&mut self, value: u16) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Write a little-endian u32
    fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Write a little-endian i32
    fn write_i32_le(&mut self, value: i32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Write a little-endian f32
    fn write_f32_le(&mut self, value: f32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Write a length-prefixed string
    fn write_string(&mut self, value: &str) -> io::Result<()> {
        let len = i32::try_from(value.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
        self.write_i32_le(len)?;
        self.write_all(value.as_bytes())
    }

    /// Write `len` zero bytes
    fn write_zeros(&mut self, len: usize) -> io::Result<()> {
        const ZEROS: [u8; 64] = [0u8; 64];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(ZEROS.len());
            self.write_all(&ZEROS[..n])?;
            remaining -= n;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}
