use crate::error::{Result, UnccpError};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Second half of every `.pyc` magic.
pub const MAGIC_TAIL: [u8; 2] = *b"\r\n";

/// Marshal type byte for a code object; `FLAG_REF` may be or-ed in from 3.4 on.
pub const TYPE_CODE: u8 = b'c';
pub const FLAG_REF: u8 = 0x80;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PyVersion {
    pub major: u8,
    pub minor: u8,
}

impl PyVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Bytes between the start of the file and the marshalled code object.
    pub fn header_len(self) -> usize {
        if self < PyVersion::new(3, 3) {
            8
        } else if self < PyVersion::new(3, 7) {
            12
        } else {
            16
        }
    }
}

impl fmt::Display for PyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PyVersion {
    type Err = UnccpError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || UnccpError::InvalidOption(format!("python version `{s}`, expected X.Y"));
        let (major, minor) = s.trim().split_once('.').ok_or_else(bad)?;
        let v = PyVersion::new(
            major.parse().map_err(|_| bad())?,
            minor.parse().map_err(|_| bad())?,
        );
        if release_for(v).is_none() {
            return Err(UnccpError::InvalidOption(format!(
                "unsupported python version {v}"
            )));
        }
        Ok(v)
    }
}

struct Release {
    version: PyVersion,
    first: u16,
    last: u16,
}

const fn rel(major: u8, minor: u8, first: u16, last: u16) -> Release {
    Release {
        version: PyVersion::new(major, minor),
        first,
        last,
    }
}

// CPython magic number ranges, alphas through final; `last` is what the release writes.
const RELEASES: &[Release] = &[
    rel(2, 7, 62171, 62211),
    rel(3, 0, 3000, 3131),
    rel(3, 1, 3141, 3151),
    rel(3, 2, 3160, 3180),
    rel(3, 3, 3190, 3230),
    rel(3, 4, 3250, 3310),
    rel(3, 5, 3320, 3351),
    rel(3, 6, 3360, 3379),
    rel(3, 7, 3390, 3394),
    rel(3, 8, 3400, 3413),
    rel(3, 9, 3420, 3425),
    rel(3, 10, 3430, 3439),
    rel(3, 11, 3450, 3495),
    rel(3, 12, 3500, 3531),
    rel(3, 13, 3550, 3571),
];

fn release_for(v: PyVersion) -> Option<&'static Release> {
    RELEASES.iter().find(|r| r.version == v)
}

pub fn version_for_magic(magic: u16) -> Option<PyVersion> {
    RELEASES
        .iter()
        .find(|r| (r.first..=r.last).contains(&magic))
        .map(|r| r.version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PycHeader {
    pub magic: u16,
    pub version: PyVersion,
}

impl PycHeader {
    /// Header a given release would write, with zeroed timestamp and size fields.
    pub fn for_version(version: PyVersion) -> Option<Self> {
        release_for(version).map(|r| Self {
            magic: r.last,
            version,
        })
    }

    pub fn len(&self) -> usize {
        self.version.header_len()
    }

    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(&self.magic.to_le_bytes())?;
        w.write_all(&MAGIC_TAIL)?;
        // flags (3.7+), mtime, source size (3.3+): all zero
        w.write_all(&vec![0u8; self.len() - 4])?;
        Ok(())
    }

    /// Parses and validates the header at the start of a `.pyc` image.
    pub fn parse(image: &[u8]) -> Result<Self> {
        let unrecognized = |m: String| UnccpError::UnrecognizedFormat(m);
        if image.len() < 4 {
            return Err(unrecognized(format!(
                "{} bytes is too short for a pyc header",
                image.len()
            )));
        }
        if image[2..4] != MAGIC_TAIL {
            return Err(unrecognized(format!(
                "bad pyc magic {:02x}{:02x}{:02x}{:02x}",
                image[0], image[1], image[2], image[3]
            )));
        }
        let magic = u16::from_le_bytes([image[0], image[1]]);
        let version = version_for_magic(magic)
            .ok_or_else(|| unrecognized(format!("unknown pyc magic number {magic}")))?;
        let hdr = Self { magic, version };
        if image.len() <= hdr.len() {
            return Err(unrecognized(format!(
                "python {version} image truncated inside header ({} bytes)",
                image.len()
            )));
        }
        if !is_code_marker(image[hdr.len()]) {
            return Err(unrecognized(format!(
                "no code object after python {version} header (found 0x{:02x})",
                image[hdr.len()]
            )));
        }
        Ok(hdr)
    }
}

pub fn is_code_marker(b: u8) -> bool {
    b & !FLAG_REF == TYPE_CODE
}

/// True when `image` begins with a `.pyc` magic (any release or not).
pub fn has_magic(image: &[u8]) -> bool {
    image.len() >= 4 && image[2..4] == MAGIC_TAIL
}
