//! PE/COFF container parsing: just enough to map RVAs and find the CLI header.

use crate::clr::bytes::{slice, u16_at, u32_at};
use crate::clr::{ImageError, ImageResult};

const DOS_SIGNATURE: &[u8] = b"MZ";
const PE_SIGNATURE: &[u8] = b"PE\0\0";
const PE32_MAGIC: u16 = 0x10B;
const PE32_PLUS_MAGIC: u16 = 0x20B;
const CLI_HEADER_DIRECTORY: usize = 14;
const SECTION_HEADER_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub raw_size: u32,
    pub raw_pointer: u32,
}

impl Section {
    fn contains(&self, rva: u32) -> bool {
        let extent = self.virtual_size.max(self.raw_size);
        rva >= self.virtual_address && rva - self.virtual_address < extent
    }
}

/// A mapped view of a PE image that carries a CLI header.
#[derive(Debug)]
pub struct PeImage<'a> {
    data: &'a [u8],
    sections: Vec<Section>,
    /// `(rva, size)` of the metadata root, from the CLI header.
    pub metadata: (u32, u32),
}

impl<'a> PeImage<'a> {
    pub fn parse(data: &'a [u8]) -> ImageResult<Self> {
        if slice(data, 0, 2)? != DOS_SIGNATURE {
            return Err(ImageError::new("missing MZ signature"));
        }

        let pe = u32_at(data, 0x3C)? as usize;
        if slice(data, pe, 4)? != PE_SIGNATURE {
            return Err(ImageError::new("missing PE signature"));
        }

        let coff = pe + 4;
        let section_count = usize::from(u16_at(data, coff + 2)?);
        let optional_size = usize::from(u16_at(data, coff + 16)?);
        let optional = coff + 20;

        let (rva_count_offset, directories) = match u16_at(data, optional)? {
            PE32_MAGIC => (92, 96),
            PE32_PLUS_MAGIC => (108, 112),
            other => {
                return Err(ImageError::new(format!(
                    "unknown optional header magic {other:#x}"
                )));
            }
        };

        let rva_count = u32_at(data, optional + rva_count_offset)? as usize;
        if rva_count <= CLI_HEADER_DIRECTORY {
            return Err(ImageError::new("image has no CLI header directory"));
        }

        let cli_entry = optional + directories + CLI_HEADER_DIRECTORY * 8;
        let cli_rva = u32_at(data, cli_entry)?;
        if cli_rva == 0 {
            return Err(ImageError::new("image is not a CLI assembly"));
        }

        let table = optional + optional_size;
        let sections = (0..section_count)
            .map(|i| {
                let at = table + i * SECTION_HEADER_SIZE;
                Ok(Section {
                    virtual_size: u32_at(data, at + 8)?,
                    virtual_address: u32_at(data, at + 12)?,
                    raw_size: u32_at(data, at + 16)?,
                    raw_pointer: u32_at(data, at + 20)?,
                })
            })
            .collect::<ImageResult<Vec<_>>>()?;

        let mut image = Self {
            data,
            sections,
            metadata: (0, 0),
        };

        let cli = image.offset(cli_rva)?;
        image.metadata = (u32_at(data, cli + 8)?, u32_at(data, cli + 12)?);
        Ok(image)
    }

    /// Translates a relative virtual address to a file offset.
    pub fn offset(&self, rva: u32) -> ImageResult<usize> {
        let section = self
            .sections
            .iter()
            .find(|s| s.contains(rva))
            .ok_or_else(|| ImageError::new(format!("RVA {rva:#x} is outside every section")))?;
        (rva - section.virtual_address)
            .checked_add(section.raw_pointer)
            .map(|offset| offset as usize)
            .ok_or_else(|| ImageError::new(format!("RVA {rva:#x} maps past the end of the file")))
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The metadata root bytes.
    pub fn metadata_bytes(&self) -> ImageResult<&'a [u8]> {
        let (rva, size) = self.metadata;
        slice(self.data, self.offset(rva)?, size as usize)
    }
}
