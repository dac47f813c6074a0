//! Zip sniff helper + safe Zip32 entry cursor.
//!
//! # Invariants
//! - All sizes/offsets are untrusted and validated against the container length.
//! - Central directory traversal is forward-only; a cursor is never rewound.
//!   Callers that need a second pass open a new cursor.
//! - Every `next_entry` call re-seeks to the directory position, so payload
//!   reads in between may move the shared handle freely.
//!
//! # Supported
//! - Zip32 (EOCD + central directory).
//! - Entries: stored (method 0) and deflate (method 8).
//!
//! # Not Supported
//! - Zip64 (sentinel 0xFFFF/0xFFFFFFFF fields).
//! - Multi-disk archives.
//! - Decrypting encrypted entries (flag bit 0); they are reported, not read.

use std::io::{self, Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;
use flate2::Crc;

use crate::outcome::ArchiveFault;

/// ZIP signatures are `PK..`.
///
/// Common ones:
/// - Local file header:      PK 03 04
/// - Central directory:      PK 01 02
/// - End of central dir:     PK 05 06
/// - Data descriptor:        PK 07 08
#[inline(always)]
pub fn is_zip_magic(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }
    if header[0] != b'P' || header[1] != b'K' {
        return false;
    }
    matches!((header[2], header[3]), (1, 2) | (3, 4) | (5, 6) | (7, 8))
}

const SIG_EOCD: u32 = 0x0605_4b50;
const SIG_CDFH: u32 = 0x0201_4b50;
const SIG_LFH: u32 = 0x0403_4b50;

const EOCD_MIN_LEN: usize = 22;
const EOCD_SEARCH_MAX: usize = 66 * 1024; // 64 KiB comment + header margin

/// Central directory fixed header length.
const CDFH_LEN: usize = 46;
/// Local file header fixed length.
const LFH_LEN: usize = 30;

const READ_CHUNK: usize = 8192;
/// Upper bound on the up-front buffer for one payload; the declared size is
/// untrusted until the bytes are actually read.
const PREALLOC_MAX: u64 = 1024 * 1024;

/// Outcome of opening a ZIP container.
pub enum ZipOpen<R> {
    Ready(ZipCursor<R>),
    Stop(ArchiveFault),
}

/// Outcome of advancing the central-directory cursor.
pub enum ZipNext<'a> {
    End,
    Entry(ZipEntryMeta<'a>),
    Stop(ArchiveFault),
}

/// Central-directory metadata for a single entry.
///
/// `name` borrows the cursor's name buffer and is valid until the next call
/// that advances the cursor. Use [`ZipEntryMeta::locator`] to keep what is
/// needed to open the payload afterwards.
pub struct ZipEntryMeta<'a> {
    pub name: &'a [u8],
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
    pub is_dir: bool,
}

impl ZipEntryMeta<'_> {
    #[inline(always)]
    pub fn is_encrypted(&self) -> bool {
        (self.flags & 0x0001) != 0
    }

    #[inline(always)]
    pub fn compression_supported(&self) -> bool {
        self.method == 0 || self.method == 8
    }

    pub fn locator(&self) -> EntryLocator {
        EntryLocator {
            flags: self.flags,
            method: self.method,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            local_header_offset: self.local_header_offset,
        }
    }
}

/// Owned subset of entry metadata needed to read the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryLocator {
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

/// Forward-only cursor over the central directory of one container.
pub struct ZipCursor<R> {
    src: R,
    src_len: u64,

    cd_pos: u64,
    cd_end: u64,

    entries_total: u32,
    entries_seen: u32,

    name_buf: Vec<u8>,
}

impl<R: Read + Seek> ZipCursor<R> {
    /// Open a ZIP container and position the cursor at the first directory
    /// record.
    ///
    /// Returns:
    /// - `ZipOpen::Ready` when the container is parsable.
    /// - `ZipOpen::Stop` for malformed data, unsupported features (Zip64,
    ///   multi-disk), or an entry count above `max_entries`.
    pub fn open(mut src: R, max_entries: u32) -> io::Result<ZipOpen<R>> {
        let src_len = src.seek(SeekFrom::End(0))?;
        if src_len < EOCD_MIN_LEN as u64 {
            return Ok(ZipOpen::Stop(ArchiveFault::MalformedZip));
        }

        // Read tail window.
        let win_len = (src_len as usize).min(EOCD_SEARCH_MAX);
        let win_off = src_len - win_len as u64;
        let mut win = vec![0u8; win_len];
        src.seek(SeekFrom::Start(win_off))?;
        read_exact_n(&mut src, &mut win)?;

        let eocd_rel = match find_eocd(&win, win_off) {
            Some(i) => i,
            None => return Ok(ZipOpen::Stop(ArchiveFault::MalformedZip)),
        };
        let eocd_off = win_off + eocd_rel as u64;
        let eocd = &win[eocd_rel..];

        let disk_no = le_u16(&eocd[4..6]);
        let cd_disk = le_u16(&eocd[6..8]);
        let entries_disk = le_u16(&eocd[8..10]);
        let entries_total = le_u16(&eocd[10..12]);
        let cd_size = le_u32(&eocd[12..16]);
        let cd_off = le_u32(&eocd[16..20]);

        // Multi-disk unsupported.
        if disk_no != 0 || cd_disk != 0 || entries_disk != entries_total {
            return Ok(ZipOpen::Stop(ArchiveFault::UnsupportedFeature));
        }

        // Zip64 sentinel values in EOCD -> unsupported.
        if entries_total == 0xFFFF || cd_size == 0xFFFF_FFFF || cd_off == 0xFFFF_FFFF {
            return Ok(ZipOpen::Stop(ArchiveFault::UnsupportedFeature));
        }

        if u32::from(entries_total) > max_entries {
            return Ok(ZipOpen::Stop(ArchiveFault::EntryCountExceeded));
        }

        let cd_off = u64::from(cd_off);
        let cd_end = cd_off.saturating_add(u64::from(cd_size));
        if cd_end > eocd_off {
            return Ok(ZipOpen::Stop(ArchiveFault::MalformedZip));
        }

        Ok(ZipOpen::Ready(Self {
            src,
            src_len,
            cd_pos: cd_off,
            cd_end,
            entries_total: u32::from(entries_total),
            entries_seen: 0,
            name_buf: Vec::with_capacity(256),
        }))
    }

    /// Number of entries the directory declares.
    pub fn entries_total(&self) -> u32 {
        self.entries_total
    }

    /// Yield the next central-directory entry.
    pub fn next_entry(&mut self) -> io::Result<ZipNext<'_>> {
        if self.entries_seen >= self.entries_total || self.cd_pos >= self.cd_end {
            return Ok(ZipNext::End);
        }

        if self.cd_pos.saturating_add(CDFH_LEN as u64) > self.cd_end {
            return Ok(ZipNext::Stop(ArchiveFault::MalformedZip));
        }

        self.src.seek(SeekFrom::Start(self.cd_pos))?;
        let mut hdr = [0u8; CDFH_LEN];
        read_exact_n(&mut self.src, &mut hdr)?;

        if le_u32(&hdr[0..4]) != SIG_CDFH {
            return Ok(ZipNext::Stop(ArchiveFault::MalformedZip));
        }
        self.entries_seen += 1;

        let flags = le_u16(&hdr[8..10]);
        let method = le_u16(&hdr[10..12]);
        let crc32 = le_u32(&hdr[16..20]);
        let comp_size = le_u32(&hdr[20..24]);
        let uncomp_size = le_u32(&hdr[24..28]);

        let name_len = le_u16(&hdr[28..30]) as usize;
        let extra_len = le_u16(&hdr[30..32]) as usize;
        let comment_len = le_u16(&hdr[32..34]) as usize;

        let lfh_off = le_u32(&hdr[42..46]);

        // Zip64 sentinel in CDFH -> unsupported.
        if comp_size == 0xFFFF_FFFF || uncomp_size == 0xFFFF_FFFF || lfh_off == 0xFFFF_FFFF {
            return Ok(ZipNext::Stop(ArchiveFault::UnsupportedFeature));
        }

        let rec_len = (CDFH_LEN + name_len + extra_len + comment_len) as u64;
        if self.cd_pos.saturating_add(rec_len) > self.cd_end {
            return Ok(ZipNext::Stop(ArchiveFault::MalformedZip));
        }

        self.name_buf.clear();
        self.name_buf.resize(name_len, 0);
        read_exact_n(&mut self.src, &mut self.name_buf)?;

        // Extra + comment are skipped by advancing past the whole record.
        self.cd_pos += rec_len;

        // Directory heuristic: name ends with '/'.
        let is_dir = self.name_buf.last().copied() == Some(b'/');

        Ok(ZipNext::Entry(ZipEntryMeta {
            name: &self.name_buf,
            flags,
            method,
            crc32,
            compressed_size: u64::from(comp_size),
            uncompressed_size: u64::from(uncomp_size),
            local_header_offset: u64::from(lfh_off),
            is_dir,
        }))
    }

    /// Open a decompressing reader for the entry described by `loc`.
    ///
    /// Validates the local header and payload bounds against the container
    /// length.
    pub fn open_entry(
        &mut self,
        loc: EntryLocator,
    ) -> io::Result<Result<ZipEntryReader<'_, R>, ArchiveFault>> {
        if loc.flags & 0x0001 != 0 {
            return Ok(Err(ArchiveFault::EncryptedEntry));
        }
        if loc.local_header_offset.saturating_add(LFH_LEN as u64) > self.src_len {
            return Ok(Err(ArchiveFault::MalformedZip));
        }

        self.src.seek(SeekFrom::Start(loc.local_header_offset))?;
        let mut lfh = [0u8; LFH_LEN];
        read_exact_n(&mut self.src, &mut lfh)?;

        if le_u32(&lfh[0..4]) != SIG_LFH {
            return Ok(Err(ArchiveFault::MalformedZip));
        }

        let name_len = u64::from(le_u16(&lfh[26..28]));
        let extra_len = u64::from(le_u16(&lfh[28..30]));

        let data_start = loc
            .local_header_offset
            .saturating_add(LFH_LEN as u64)
            .saturating_add(name_len)
            .saturating_add(extra_len);
        let data_end = data_start.saturating_add(loc.compressed_size);
        if data_start > self.src_len || data_end > self.src_len {
            return Ok(Err(ArchiveFault::MalformedZip));
        }

        self.src.seek(SeekFrom::Start(data_start))?;
        let take = LimitedRead::new(&mut self.src, loc.compressed_size);

        let r = match loc.method {
            0 => ZipEntryReader::Stored(take),
            8 => ZipEntryReader::Deflate(DeflateDecoder::new(take)),
            _ => return Ok(Err(ArchiveFault::UnsupportedCompression)),
        };
        Ok(Ok(r))
    }

    /// Read the whole decompressed payload of `loc`.
    ///
    /// The payload is read with repeated bounded reads until end-of-entry and
    /// checked against the declared size and CRC-32.
    pub fn read_entry(
        &mut self,
        loc: EntryLocator,
        max_bytes: u64,
    ) -> io::Result<Result<Vec<u8>, ArchiveFault>> {
        if loc.uncompressed_size > max_bytes {
            return Ok(Err(ArchiveFault::EntryTooLarge));
        }
        let mut reader = match self.open_entry(loc)? {
            Ok(r) => r,
            Err(fault) => return Ok(Err(fault)),
        };

        let expected = loc.uncompressed_size;
        let mut out = Vec::with_capacity(expected.min(PREALLOC_MAX) as usize);
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            // Stop inflating as soon as output overruns the declared size.
            if (out.len() + n) as u64 > expected {
                return Ok(Err(ArchiveFault::CorruptPayload));
            }
            out.extend_from_slice(&chunk[..n]);
        }

        if out.len() as u64 != expected {
            return Ok(Err(ArchiveFault::CorruptPayload));
        }
        let mut crc = Crc::new();
        crc.update(&out);
        if crc.sum() != loc.crc32 {
            return Ok(Err(ArchiveFault::CorruptPayload));
        }
        Ok(Ok(out))
    }
}

/// Decompressed reader for a ZIP entry.
pub enum ZipEntryReader<'a, R> {
    Stored(LimitedRead<'a, R>),
    Deflate(DeflateDecoder<LimitedRead<'a, R>>),
}

impl<R: Read> Read for ZipEntryReader<'_, R> {
    #[inline]
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        match self {
            ZipEntryReader::Stored(r) => r.read(dst),
            ZipEntryReader::Deflate(r) => r.read(dst),
        }
    }
}

/// Read wrapper that limits reads to a fixed number of bytes.
///
/// This is used to bound entry payload reads to the compressed size.
pub struct LimitedRead<'a, R: ?Sized> {
    inner: &'a mut R,
    remaining: u64,
}

impl<'a, R: ?Sized + Read> LimitedRead<'a, R> {
    #[inline]
    pub fn new(inner: &'a mut R, remaining: u64) -> Self {
        Self { inner, remaining }
    }
}

impl<R: ?Sized + Read> Read for LimitedRead<'_, R> {
    #[inline]
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = self.remaining.min(dst.len() as u64) as usize;
        let n = self.inner.read(&mut dst[..max])?;
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}

/// Locate the EOCD record in the tail window starting at `win_off`.
///
/// A candidate must end exactly at EOF once its declared comment is counted.
/// Scanning backward, the first candidate whose central directory ends right
/// where the candidate starts is taken; a signature inside an archive comment
/// fails that check. If no candidate is consistent, the one nearest EOF is
/// returned so the caller can classify it (Zip64 sentinels, bad bounds).
fn find_eocd(win: &[u8], win_off: u64) -> Option<usize> {
    if win.len() < EOCD_MIN_LEN {
        return None;
    }
    let mut fallback = None;
    let mut i = win.len() - EOCD_MIN_LEN;
    loop {
        if le_u32(&win[i..i + 4]) == SIG_EOCD {
            let comment_len = le_u16(&win[i + 20..i + 22]) as usize;
            if i + EOCD_MIN_LEN + comment_len == win.len() {
                let cd_size = u64::from(le_u32(&win[i + 12..i + 16]));
                let cd_off = u64::from(le_u32(&win[i + 16..i + 20]));
                if cd_off + cd_size == win_off + i as u64 {
                    return Some(i);
                }
                fallback.get_or_insert(i);
            }
        }
        if i == 0 {
            return fallback;
        }
        i -= 1;
    }
}

#[inline(always)]
fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline(always)]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_exact_n<R: Read + ?Sized>(r: &mut R, dst: &mut [u8]) -> io::Result<()> {
    let mut off = 0;
    while off < dst.len() {
        let n = match r.read(&mut dst[off..]) {
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "zip truncated",
            ));
        }
        off += n;
    }
    Ok(())
}
