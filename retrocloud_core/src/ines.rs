//! Validation of iNES ROM images before they are handed to the emulation library.
//!
//! Only the 16 byte header is inspected. The emulation library does the actual parsing, this
//! module rejects buffers that are not iNES images at all so the failure can be reported with a
//! useful message.
use intbits::Bits;
use log::warn;
use packed_struct::prelude::*;

use crate::error::BridgeError;

pub const HEADER_SIZE: usize = 16;
pub const INES_MAGIC: [u8; 4] = *b"NES\x1A";
const FDS_MAGIC: [u8; 4] = *b"FDS\x1A";
const UNIF_MAGIC: [u8; 4] = *b"UNIF";

const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;
const TRAINER_SIZE: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InesHeader {
    pub prg_rom_size: usize,
    /// Zero means the cartridge uses CHR RAM.
    pub chr_rom_size: usize,
    pub mapper: u16,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub trainer: bool,
    pub nes2: bool,
}

impl InesHeader {
    /// Parses and validates the header of `rom`.
    pub fn parse(rom: &[u8]) -> Result<InesHeader, BridgeError> {
        if rom.len() < HEADER_SIZE {
            return Err(BridgeError::Malformed {
                reason: format!(
                    "file is {} bytes, shorter than the {HEADER_SIZE} byte header",
                    rom.len()
                ),
            });
        }
        let magic = &rom[0..4];
        if magic == FDS_MAGIC {
            return Err(BridgeError::UnsupportedFormat {
                reason: "Famicom Disk System images are not supported".to_string(),
            });
        }
        if magic == UNIF_MAGIC {
            return Err(BridgeError::UnsupportedFormat {
                reason: "UNIF images are not supported".to_string(),
            });
        }
        if magic != INES_MAGIC {
            return Err(BridgeError::Malformed {
                reason: format!("missing iNES signature, found {:02X?}", magic),
            });
        }

        let raw = RawInesHeader::unpack_from_slice(&rom[0..HEADER_SIZE]).map_err(|err| {
            BridgeError::Malformed {
                reason: format!("unreadable header: {err:?}"),
            }
        })?;
        let nes2 = raw.flags7.bits(2..=3) == 0b10;
        let header = InesHeader {
            prg_rom_size: raw.prg_rom_banks as usize * PRG_BANK_SIZE,
            chr_rom_size: raw.chr_rom_banks as usize * CHR_BANK_SIZE,
            mapper: (raw.flags6.bits(4..=7) as u16) | ((raw.flags7.bits(4..=7) as u16) << 4),
            mirroring: if raw.flags6.bit(3) {
                Mirroring::FourScreen
            } else if raw.flags6.bit(0) {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            battery: raw.flags6.bit(1),
            trainer: raw.flags6.bit(2),
            nes2,
        };

        // The library decides whether it can run a short image.
        let expected = header.expected_file_size();
        if rom.len() < expected {
            warn!(
                "Header declares {expected} bytes of data but the file has {}",
                rom.len()
            );
        }
        Ok(header)
    }

    /// Header, trainer, PRG and CHR data combined.
    pub fn expected_file_size(&self) -> usize {
        let trainer = if self.trainer { TRAINER_SIZE } else { 0 };
        HEADER_SIZE + trainer + self.prg_rom_size + self.chr_rom_size
    }
}

#[derive(PackedStruct, Clone, Debug, Default, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb")]
struct RawInesHeader {
    magic: [u8; 4],
    prg_rom_banks: u8,
    chr_rom_banks: u8,
    flags6: u8,
    flags7: u8,
    prg_ram_banks: u8,
    flags9: u8,
    flags10: u8,
    padding: [u8; 5],
}

/// Builds a minimal image with the given header bytes and zeroed PRG/CHR data.
#[cfg(test)]
pub(crate) fn test_rom(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
    let mut rom = vec![0; HEADER_SIZE];
    rom[0..4].copy_from_slice(&INES_MAGIC);
    rom[4] = prg_banks;
    rom[5] = chr_banks;
    rom[6] = flags6;
    rom[7] = flags7;
    rom.resize(
        HEADER_SIZE + prg_banks as usize * PRG_BANK_SIZE + chr_banks as usize * CHR_BANK_SIZE,
        0,
    );
    rom
}
