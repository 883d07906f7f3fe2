//! Big-endian primitive readers and writers

use std::io::{self, Read, Write};

use crate::error::{DecodeError, EncodeError, Section};
use crate::MAX_STRING_LEN;

/// Reads big-endian primitives, tagging failures with the current section
pub(crate) struct ModelReader<R> {
    input: R,
    section: Section,
}

impl<R: Read> ModelReader<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            input,
            section: Section::GlobalProperties,
        }
    }

    /// Set the section reported by subsequent errors
    pub(crate) fn enter(&mut self, section: Section) {
        self.section = section;
    }

    pub(crate) fn section(&self) -> Section {
        self.section
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        self.input.read_exact(&mut buf).map_err(|e| self.map_io(e))?;
        Ok(buf)
    }

    fn map_io(&self, e: io::Error) -> DecodeError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof {
                section: self.section,
            }
        } else {
            DecodeError::Io(e)
        }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], DecodeError> {
        let mut values = [0.0; N];
        for value in &mut values {
            *value = self.read_f32()?;
        }
        Ok(values)
    }

    /// Read `len` raw floats
    pub(crate) fn read_f32_vec(&mut self, len: usize) -> Result<Vec<f32>, DecodeError> {
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read_f32()?);
        }
        Ok(values)
    }

    /// Read a u16 length prefix followed by UTF-8 bytes
    pub(crate) fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let mut bytes = vec![0u8; len];
        self.input
            .read_exact(&mut bytes)
            .map_err(|e| self.map_io(e))?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidString {
            section: self.section,
        })
    }

    /// Read a u8 count followed by that many strings
    pub(crate) fn read_properties(&mut self) -> Result<Vec<String>, DecodeError> {
        let count = self.read_u8()? as usize;
        let mut properties = Vec::with_capacity(count);
        for _ in 0..count {
            properties.push(self.read_string()?);
        }
        Ok(properties)
    }
}

/// Writes big-endian primitives
pub(crate) struct ModelWriter<W> {
    output: W,
    written: usize,
}

impl<W: Write> ModelWriter<W> {
    pub(crate) fn new(output: W) -> Self {
        Self { output, written: 0 }
    }

    /// Bytes written so far
    pub(crate) fn written(&self) -> usize {
        self.written
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.output.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    pub(crate) fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.write_bytes(&[value])
    }

    pub(crate) fn write_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_i16(&mut self, value: i16) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_f32(&mut self, value: f32) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub(crate) fn write_f32_slice(&mut self, values: &[f32]) -> Result<(), EncodeError> {
        for &value in values {
            self.write_f32(value)?;
        }
        Ok(())
    }

    /// Write a count prefix that validation already bounded to u8
    pub(crate) fn write_u8_count(&mut self, count: usize) -> Result<(), EncodeError> {
        self.write_u8(u8::try_from(count).map_err(|_| EncodeError::TooMany {
            what: "entries",
            count,
            max: u8::MAX as usize,
        })?)
    }

    /// Write a count prefix that validation already bounded to u16
    pub(crate) fn write_u16_count(&mut self, count: usize) -> Result<(), EncodeError> {
        self.write_u16(u16::try_from(count).map_err(|_| EncodeError::TooMany {
            what: "entries",
            count,
            max: u16::MAX as usize,
        })?)
    }

    pub(crate) fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        if value.len() > MAX_STRING_LEN {
            return Err(EncodeError::StringTooLong { len: value.len() });
        }
        self.write_u16(value.len() as u16)?;
        self.write_bytes(value.as_bytes())
    }

    pub(crate) fn write_properties(&mut self, properties: &[String]) -> Result<(), EncodeError> {
        self.write_u8_count(properties.len())?;
        for property in properties {
            self.write_string(property)?;
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<(), EncodeError> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_endian_primitives() {
        let mut buf = Vec::new();
        let mut writer = ModelWriter::new(&mut buf);
        writer.write_u16(0x0102).unwrap();
        writer.write_i16(-3).unwrap();
        writer.write_f32(1.0).unwrap();
        writer.write_string("ab").unwrap();
        assert_eq!(writer.written(), 12);
        assert_eq!(
            buf,
            [0x01, 0x02, 0xFF, 0xFD, 0x3F, 0x80, 0x00, 0x00, 0x00, 0x02, b'a', b'b']
        );

        let mut reader = ModelReader::new(Cursor::new(&buf[..]));
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_i16().unwrap(), -3);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert_eq!(reader.read_string().unwrap(), "ab");
    }

    #[test]
    fn test_eof_reports_section() {
        let mut reader = ModelReader::new(Cursor::new(&[0x00u8][..]));
        reader.enter(Section::Materials);
        match reader.read_u16() {
            Err(DecodeError::UnexpectedEof { section }) => assert_eq!(section, Section::Materials),
            other => panic!("expected EOF, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [0x00, 0x02, 0xC3, 0x28];
        let mut reader = ModelReader::new(Cursor::new(&bytes[..]));
        assert!(matches!(
            reader.read_string(),
            Err(DecodeError::InvalidString { .. })
        ));
    }

    #[test]
    fn test_string_too_long() {
        let mut writer = ModelWriter::new(Vec::new());
        let long = "x".repeat(MAX_STRING_LEN + 1);
        assert!(matches!(
            writer.write_string(&long),
            Err(EncodeError::StringTooLong { len }) if len == MAX_STRING_LEN + 1
        ));
    }
}
