//! Metadata root and the `#Strings`, `#US` and `#Blob` heaps (ECMA-335 II.24).

use crate::clr::bytes::{compressed_u32, slice, u16_at, u32_at};
use crate::clr::{ImageError, ImageResult};

const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// Stream views sliced out of the metadata root.
#[derive(Debug, Default)]
pub struct Streams<'a> {
    pub tables: &'a [u8],
    pub strings: &'a [u8],
    pub user_strings: &'a [u8],
    pub blob: &'a [u8],
}

impl<'a> Streams<'a> {
    pub fn parse(root: &'a [u8]) -> ImageResult<Self> {
        if u32_at(root, 0)? != METADATA_SIGNATURE {
            return Err(ImageError::new("missing metadata signature"));
        }

        let version_len = align4(u32_at(root, 12)? as usize);
        let mut at = 16 + version_len;
        let count = u16_at(root, at + 2)?;
        at += 4;

        let mut streams = Self::default();
        let mut has_tables = false;
        for _ in 0..count {
            let offset = u32_at(root, at)? as usize;
            let size = u32_at(root, at + 4)? as usize;
            let name_start = at + 8;
            let name_len = root
                .get(name_start..)
                .and_then(|rest| rest.iter().position(|b| *b == 0))
                .ok_or_else(|| ImageError::new("unterminated stream name"))?;
            let name = &root[name_start..name_start + name_len];
            at = name_start + align4(name_len + 1);

            let bytes = slice(root, offset, size)?;
            match name {
                b"#~" | b"#-" => {
                    streams.tables = bytes;
                    has_tables = true;
                }
                b"#Strings" => streams.strings = bytes,
                b"#US" => streams.user_strings = bytes,
                b"#Blob" => streams.blob = bytes,
                _ => {}
            }
        }

        if !has_tables {
            return Err(ImageError::new("metadata has no table stream"));
        }
        Ok(streams)
    }

    /// Null-terminated UTF-8 string from `#Strings`.
    pub fn string(&self, index: u32) -> ImageResult<&'a str> {
        let start = index as usize;
        let rest = self
            .strings
            .get(start..)
            .ok_or_else(|| ImageError::new(format!("string index {index:#x} out of range")))?;
        let len = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
        std::str::from_utf8(&rest[..len])
            .map_err(|_| ImageError::new(format!("string {index:#x} is not UTF-8")))
    }

    /// Length-prefixed blob from `#Blob`.
    pub fn blob(&self, index: u32) -> ImageResult<&'a [u8]> {
        let (len, prefix) = compressed_u32(self.blob, index as usize)?;
        slice(self.blob, index as usize + prefix, len as usize)
    }

    /// UTF-16 literal from `#US`, as referenced by an `ldstr` token.
    pub fn user_string(&self, index: u32) -> ImageResult<String> {
        let (len, prefix) = compressed_u32(self.user_strings, index as usize)?;
        // The final byte is a flag, not part of the string.
        let chars = (len as usize) / 2;
        let bytes = slice(self.user_strings, index as usize + prefix, chars * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units)
            .map_err(|_| ImageError::new(format!("user string {index:#x} is not UTF-16")))
    }
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}
