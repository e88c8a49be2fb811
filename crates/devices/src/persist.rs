//! Device persistence with zstd compression and CRC32 validation.
//!
//! All placed devices in a world save into a single `.bv` archive: a
//! fixed-width little-endian header (magic, version, CRC32, payload length)
//! followed by a zstd-compressed bincode map of position-keyed records.

use crate::buffer::BufferRecord;
use crate::cache::CacheRecord;
use anyhow::{Context, Result};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic number for device archive identification ("BVLT" = blockvault).
const ARCHIVE_MAGIC: u32 = 0x4256_4C54;

/// Current archive format version.
const ARCHIVE_VERSION: u16 = 1;

/// World position of a placed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DevicePos {
    /// Block X.
    pub x: i32,
    /// Block Y.
    pub y: i32,
    /// Block Z.
    pub z: i32,
}

impl DevicePos {
    /// Construct a position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Persisted state of one placed device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeviceRecord {
    /// A deep storage cache.
    Cache(CacheRecord),
    /// A transfer buffer.
    Buffer(BufferRecord),
}

/// Archive file header structure.
#[derive(Debug, Clone)]
struct ArchiveHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl ArchiveHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: ARCHIVE_MAGIC,
            version: ARCHIVE_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(14);
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.crc32.to_le_bytes());
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 14 {
            anyhow::bail!("Archive header too short");
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != ARCHIVE_MAGIC {
            anyhow::bail!(
                "Invalid archive magic: expected 0x{:08X}, got 0x{:08X}",
                ARCHIVE_MAGIC,
                magic
            );
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

/// File-backed store for all placed devices of a world.
pub struct DeviceStore {
    world_dir: PathBuf,
}

impl DeviceStore {
    /// Create a store rooted at the given world directory.
    pub fn new<P: AsRef<Path>>(world_dir: P) -> Result<Self> {
        let world_dir = world_dir.as_ref().to_path_buf();
        fs::create_dir_all(&world_dir).context("Failed to create world directory")?;
        Ok(Self { world_dir })
    }

    fn archive_path(&self) -> PathBuf {
        self.world_dir.join("devices.bv")
    }

    /// Whether an archive exists on disk.
    pub fn exists(&self) -> bool {
        self.archive_path().exists()
    }

    /// Save all device records.
    pub fn save(&self, devices: &BTreeMap<DevicePos, DeviceRecord>) -> Result<()> {
        let serialized = bincode::serialize(devices).context("Failed to serialize devices")?;

        // Compress with zstd (level 3 for balanced speed/compression).
        let compressed =
            zstd::encode_all(&serialized[..], 3).context("Failed to compress devices")?;

        let mut hasher = Hasher::new();
        hasher.update(&compressed);
        let crc32 = hasher.finalize();

        let header = ArchiveHeader::new(crc32, compressed.len() as u32);

        let mut file =
            File::create(self.archive_path()).context("Failed to create device archive")?;
        file.write_all(&header.to_bytes())
            .context("Failed to write header")?;
        file.write_all(&compressed)
            .context("Failed to write payload")?;

        Ok(())
    }

    /// Load all device records.
    pub fn load(&self) -> Result<BTreeMap<DevicePos, DeviceRecord>> {
        let path = self.archive_path();
        let mut file = File::open(&path)
            .with_context(|| format!("Failed to open device archive {}", path.display()))?;

        let mut header_bytes = [0u8; 14];
        file.read_exact(&mut header_bytes)
            .context("Failed to read archive header")?;
        let header = ArchiveHeader::from_bytes(&header_bytes)?;

        let mut compressed = vec![0u8; header.payload_len as usize];
        file.read_exact(&mut compressed)
            .context("Failed to read archive payload")?;

        let mut hasher = Hasher::new();
        hasher.update(&compressed);
        let computed_crc = hasher.finalize();

        if computed_crc != header.crc32 {
            anyhow::bail!(
                "CRC32 mismatch: expected {:08X}, got {:08X}",
                header.crc32,
                computed_crc
            );
        }

        let decompressed =
            zstd::decode_all(&compressed[..]).context("Failed to decompress devices")?;

        let devices: BTreeMap<DevicePos, DeviceRecord> =
            bincode::deserialize(&decompressed).context("Failed to deserialize devices")?;

        Ok(devices)
    }
}
