use crate::domain::ArchiveEntry;
use crate::error::{Result, UnccpError};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

// Upper bound for the up-front allocation; the declared size comes from the archive.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Read side of a `code.ccp`-style zip container.
pub struct ArchiveReader {
    path: PathBuf,
    zip: ZipArchive<File>,
}

/// An entry whose bytes could not be pulled out of the archive.
#[derive(Debug)]
pub struct UnreadableEntry {
    pub index: usize,
    pub path: String,
    pub error: UnccpError,
}

impl ArchiveReader {
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |source| UnccpError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        };
        let f = File::open(path).map_err(|e| open_err(zip::result::ZipError::Io(e)))?;
        let zip = ZipArchive::new(f).map_err(open_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of raw zip records, directories included.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// `(index, name)` for every file record, in archive order.
    pub fn entry_names(&self) -> Vec<(usize, String)> {
        (0..self.zip.len())
            .filter_map(|i| {
                let name = self.zip.name_for_index(i)?;
                (!is_dir_name(name)).then(|| (i, name.to_string()))
            })
            .collect()
    }

    /// Lazily reads file entries one at a time.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            zip: &mut self.zip,
            next: 0,
        }
    }
}

pub struct Entries<'a> {
    zip: &'a mut ZipArchive<File>,
    next: usize,
}

impl Iterator for Entries<'_> {
    type Item = std::result::Result<ArchiveEntry, UnreadableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.zip.len() {
            let index = self.next;
            self.next += 1;
            let path = self
                .zip
                .name_for_index(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{index}"));
            if is_dir_name(&path) {
                continue;
            }
            return Some(read_entry(self.zip, index, path));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.zip.len() - self.next))
    }
}

fn read_entry(
    zip: &mut ZipArchive<File>,
    index: usize,
    path: String,
) -> std::result::Result<ArchiveEntry, UnreadableEntry> {
    let unreadable = |path: &str, message: String| UnreadableEntry {
        index,
        path: path.to_string(),
        error: UnccpError::EntryRead {
            path: path.to_string(),
            message,
        },
    };

    let mut zf = match zip.by_index(index) {
        Ok(zf) => zf,
        Err(e) => return Err(unreadable(&path, e.to_string())),
    };
    let mut data = Vec::with_capacity(zf.size().min(MAX_PREALLOC) as usize);
    // CRC mismatches surface here, at end of stream
    if let Err(e) = zf.read_to_end(&mut data) {
        return Err(unreadable(&path, e.to_string()));
    }
    Ok(ArchiveEntry { index, path, data })
}

fn is_dir_name(name: &str) -> bool {
    name.ends_with('/') || name.ends_with('\\')
}
