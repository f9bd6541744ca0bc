use crate::error::{CertificateError, Result};

const ALIGNMENT: usize = 8;

/// Append-only blob builder
#[derive(Debug, Default)]
pub(crate) struct BlobWriter {
    buf: Vec<u8>,
}

impl BlobWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// One little-endian word: `first` in the high half, `second` in the low half.
    pub(crate) fn write_pair(&mut self, first: u32, second: u32) {
        let word = (u64::from(first) << 32) | u64::from(second);
        self.buf.extend_from_slice(&word.to_le_bytes());
    }

    /// Length-prefixed bytes, padded to the word boundary.
    pub(crate) fn write_bytes(&mut self, what: &str, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| CertificateError::encode(format!("{what} is too large to encode")))?;
        self.write_pair(len, 0);
        self.buf.extend_from_slice(bytes);
        self.pad();
        Ok(())
    }

    /// Length-prefixed UTF-16LE text; the length counts code units.
    pub(crate) fn write_utf16(&mut self, what: &str, text: &str) -> Result<()> {
        let units = text.encode_utf16().count();
        let len = u32::try_from(units)
            .map_err(|_| CertificateError::encode(format!("{what} is too large to encode")))?;
        self.write_pair(len, 0);
        for unit in text.encode_utf16() {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
        self.pad();
        Ok(())
    }

    fn pad(&mut self) {
        let padded = self.buf.len().next_multiple_of(ALIGNMENT);
        self.buf.resize(padded, 0);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_layout() {
        let mut writer = BlobWriter::new();
        writer.write_pair(1, 4);
        assert_eq!(writer.into_bytes(), [4, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_bytes_length_sits_in_high_half() {
        let mut writer = BlobWriter::new();
        writer.write_bytes("certificate", &[0x30, 0x01, 0x00]).expect("write");
        assert_eq!(
            writer.into_bytes(),
            [0, 0, 0, 0, 3, 0, 0, 0, 0x30, 0x01, 0x00, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_utf16_is_padded_to_word() {
        let mut writer = BlobWriter::new();
        writer.write_utf16("text", "abc").expect("write");
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(&bytes[8..], &[b'a', 0, b'b', 0, b'c', 0, 0, 0]);
    }
}
