use crate::error::{CertificateError, Result};
use zeroize::Zeroizing;

const ALIGNMENT: usize = 8;

/// Cursor over a blob; every read is bounds-checked
#[derive(Debug)]
pub(crate) struct BlobReader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    fn take(&mut self, what: &str, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| CertificateError::decode(format!("truncated {what}")))?;
        let bytes = &self.input[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub(crate) fn read_pair(&mut self, what: &str) -> Result<(u32, u32)> {
        let bytes = self.take(what, 8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        let word = u64::from_le_bytes(word);
        Ok(((word >> 32) as u32, (word & 0xffff_ffff) as u32))
    }

    fn read_length(&mut self, what: &str) -> Result<usize> {
        let (len, reserved) = self.read_pair(what)?;
        if reserved != 0 {
            return Err(CertificateError::decode(format!(
                "{what} has a non-zero reserved word"
            )));
        }
        usize::try_from(len).map_err(|_| CertificateError::decode(format!("{what} is too large")))
    }

    fn skip_padding(&mut self, what: &str) -> Result<()> {
        let padded = self.offset.next_multiple_of(ALIGNMENT);
        let padding = self.take(what, padded - self.offset)?;
        if padding.iter().any(|b| *b != 0) {
            return Err(CertificateError::decode(format!("{what} has non-zero padding")));
        }
        Ok(())
    }

    pub(crate) fn read_bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_length(what)?;
        let bytes = self.take(what, len)?;
        self.skip_padding(what)?;
        Ok(bytes)
    }

    pub(crate) fn read_utf16(&mut self, what: &str) -> Result<Zeroizing<String>> {
        let units = self.read_length(what)?;
        let byte_len = units
            .checked_mul(2)
            .ok_or_else(|| CertificateError::decode(format!("{what} is too large")))?;
        let bytes = self.take(what, byte_len)?;
        self.skip_padding(what)?;

        let units: Zeroizing<Vec<u16>> = Zeroizing::new(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        );
        String::from_utf16(&units)
            .map(Zeroizing::new)
            .map_err(|_| CertificateError::decode(format!("{what} is not valid UTF-16")))
    }

    pub(crate) fn finish(self) -> Result<()> {
        let trailing = self.input.len() - self.offset;
        if trailing > 0 {
            return Err(CertificateError::decode(format!(
                "{trailing} trailing bytes after certificate record"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pair_splits_word() {
        let mut reader = BlobReader::new(&[4, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(reader.read_pair("header").expect("pair"), (1, 4));
        reader.finish().expect("fully consumed");
    }

    #[test]
    fn test_truncated_payload_fails() {
        let blob = [0, 0, 0, 0, 16, 0, 0, 0, 1, 2, 3];
        let err = BlobReader::new(&blob).read_bytes("certificate").expect_err("truncated");
        assert!(err.to_string().contains("truncated certificate"), "{err}");
    }

    #[test]
    fn test_length_round_trips_through_writer() {
        let mut writer = crate::codec::writer::BlobWriter::new();
        writer.write_bytes("certificate", &[1, 2, 3]).expect("write");
        writer.write_utf16("private key", "{}").expect("write");
        let blob = writer.into_bytes();

        let mut reader = BlobReader::new(&blob);
        assert_eq!(reader.read_bytes("certificate").expect("bytes"), &[1, 2, 3]);
        assert_eq!(reader.read_utf16("private key").expect("text").as_str(), "{}");
        reader.finish().expect("fully consumed");
    }

    #[test]
    fn test_non_zero_reserved_word_fails() {
        let blob = [16, 0, 0, 0, 0, 0, 0, 0];
        let err = BlobReader::new(&blob).read_bytes("certificate").expect_err("reserved");
        assert!(err.to_string().contains("non-zero reserved word"), "{err}");
    }

    #[test]
    fn test_non_zero_padding_fails() {
        let blob = [0, 0, 0, 0, 1, 0, 0, 0, 0xaa, 0, 0, 9, 0, 0, 0, 0];
        let err = BlobReader::new(&blob).read_bytes("certificate").expect_err("padding");
        assert!(err.to_string().contains("non-zero padding"), "{err}");
    }

    #[test]
    fn test_unpaired_surrogate_fails() {
        let blob = [0, 0, 0, 0, 1, 0, 0, 0, 0x00, 0xd8, 0, 0, 0, 0, 0, 0];
        let err = BlobReader::new(&blob).read_utf16("private key").expect_err("surrogate");
        assert!(err.to_string().contains("not valid UTF-16"), "{err}");
    }
}
