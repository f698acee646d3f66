//! AEF executable image.
//!
//! ```text
//! +0  ident   AE 41 45 46 00 00 00 00
//! +8  entry   u16 little endian
//! +10 size    u16 little endian
//! +12 program `size` bytes starting at address 0
//! ```

use thiserror::Error;

pub const MAGIC: [u8; 8] = [0xAE, b'A', b'E', b'F', 0, 0, 0, 0];
pub const HEADER_SIZE: usize = 12;
pub const MEM_SIZE: usize = 0x10000;
/// Largest program the 16-bit size field can describe.
pub const MAX_PROGRAM: usize = u16::MAX as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image is {0} bytes, shorter than the {HEADER_SIZE} byte header")]
    TooShort(usize),
    #[error("Not an AEF image (bad ident bytes)")]
    BadMagic,
    #[error("Image declares {declared} program bytes but carries {actual}")]
    Truncated { declared: usize, actual: usize },
}

/// The 64 KiB memory image together with its header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    entry: u16,
    size: u16,
    mem: Box<[u8]>,
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl Image {
    pub fn new() -> Self {
        Image {
            entry: 0,
            size: 0,
            mem: vec![0; MEM_SIZE].into_boxed_slice(),
        }
    }

    pub fn write(&mut self, addr: u16, byte: u8) {
        self.mem[addr as usize] = byte;
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    pub fn set_size(&mut self, size: u16) {
        self.size = size;
    }

    pub fn set_entry(&mut self, entry: u16) {
        self.entry = entry;
    }

    pub fn entry(&self) -> u16 {
        self.entry
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// The bytes that land in the file: memory from address 0 up to `size`.
    pub fn program(&self) -> &[u8] {
        &self.mem[..self.size as usize]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.size as usize);
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.entry.to_le_bytes());
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.extend_from_slice(self.program());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ImageError::TooShort(bytes.len()));
        }
        if bytes[..8] != MAGIC {
            return Err(ImageError::BadMagic);
        }
        let entry = u16::from_le_bytes([bytes[8], bytes[9]]);
        let size = u16::from_le_bytes([bytes[10], bytes[11]]);
        let program = &bytes[HEADER_SIZE..];
        if program.len() < size as usize {
            return Err(ImageError::Truncated {
                declared: size as usize,
                actual: program.len(),
            });
        }
        let mut image = Image::new();
        image.mem[..size as usize].copy_from_slice(&program[..size as usize]);
        image.entry = entry;
        image.size = size;
        Ok(image)
    }
}
