//! Deterministic zip builder for test archives.
//!
//! Output is Zip32-only with fixed timestamps and explicit sizes (no data
//! descriptors). Encrypted entries set the flag bit but do not encrypt payload
//! bytes; this is sufficient for exercising scanner behavior. Unlike real
//! writers it happily emits duplicate names, unknown methods, and archive
//! comments containing fake signatures.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

/// One entry to emit. Names ending in `/` are written as directories.
#[derive(Clone, Copy, Debug)]
pub struct RawEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    /// 0 = stored, 8 = deflate; anything else is stored verbatim under that id.
    pub method: u16,
    pub encrypted: bool,
}

impl<'a> RawEntry<'a> {
    pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            method: 0,
            encrypted: false,
        }
    }

    pub fn deflated(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            method: 8,
            ..Self::stored(name, data)
        }
    }

    pub fn dir(name: &'a str) -> Self {
        Self::stored(name, &[])
    }
}

pub fn build_zip_bytes(entries: &[RawEntry<'_>]) -> io::Result<Vec<u8>> {
    build_zip_bytes_with_comment(entries, b"")
}

/// Like [`build_zip_bytes`], with a trailing archive comment after the EOCD.
pub fn build_zip_bytes_with_comment(
    entries: &[RawEntry<'_>],
    comment: &[u8],
) -> io::Result<Vec<u8>> {
    fn u16le(v: u16) -> [u8; 2] {
        v.to_le_bytes()
    }
    fn u32le(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    let mut out = Vec::new();
    let mut cd = Vec::new();

    for entry in entries {
        let name_bytes = entry.name.as_bytes();
        let flags: u16 = if entry.encrypted { 0x0001 } else { 0x0000 };

        let mut crc = Crc::new();
        crc.update(entry.data);
        let crc = crc.sum();

        let data = if entry.method == 8 {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(entry.data)?;
            encoder.finish()?
        } else {
            entry.data.to_vec()
        };

        let local_off = out.len() as u32;

        out.extend_from_slice(&u32le(0x04034b50));
        out.extend_from_slice(&u16le(20));
        out.extend_from_slice(&u16le(flags));
        out.extend_from_slice(&u16le(entry.method));
        out.extend_from_slice(&u16le(0));
        out.extend_from_slice(&u16le(0));
        out.extend_from_slice(&u32le(crc));
        out.extend_from_slice(&u32le(data.len() as u32));
        out.extend_from_slice(&u32le(entry.data.len() as u32));
        out.extend_from_slice(&u16le(name_bytes.len() as u16));
        out.extend_from_slice(&u16le(0));
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(&data);

        cd.extend_from_slice(&u32le(0x02014b50));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u16le(20));
        cd.extend_from_slice(&u16le(flags));
        cd.extend_from_slice(&u16le(entry.method));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u32le(crc));
        cd.extend_from_slice(&u32le(data.len() as u32));
        cd.extend_from_slice(&u32le(entry.data.len() as u32));
        cd.extend_from_slice(&u16le(name_bytes.len() as u16));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u16le(0));
        cd.extend_from_slice(&u32le(0));
        cd.extend_from_slice(&u32le(local_off));
        cd.extend_from_slice(name_bytes);
    }

    let cd_start = out.len() as u32;
    out.extend_from_slice(&cd);
    let cd_size = cd.len() as u32;

    out.extend_from_slice(&u32le(0x06054b50));
    out.extend_from_slice(&u16le(0));
    out.extend_from_slice(&u16le(0));
    out.extend_from_slice(&u16le(entries.len() as u16));
    out.extend_from_slice(&u16le(entries.len() as u16));
    out.extend_from_slice(&u32le(cd_size));
    out.extend_from_slice(&u32le(cd_start));
    out.extend_from_slice(&u16le(comment.len() as u16));
    out.extend_from_slice(comment);

    Ok(out)
}

/// Write `entries` as `<base>/<lib_prefix><name>`.
pub fn write_jar(
    base: &Path,
    lib_prefix: &str,
    name: &str,
    entries: &[RawEntry<'_>],
) -> io::Result<()> {
    let path = base.join(lib_prefix).join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, build_zip_bytes(entries)?)
}
