use crate::error::Result;

/// How a blob is wrapped inside the archive.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    Store = 0,
    Zlib = 1,
}

pub trait BlobCodec: Send + Sync {
    fn id(&self) -> CodecId;
    fn decode(&self, src: &[u8]) -> Result<Vec<u8>>;
}

/// RFC 1950 header check: deflate method and a valid FCHECK.
pub fn looks_like_zlib(blob: &[u8]) -> bool {
    match blob {
        [cmf, flg, ..] => {
            cmf & 0x0f == 8 && cmf >> 4 <= 7 && ((*cmf as u16) << 8 | *flg as u16) % 31 == 0
        }
        _ => false,
    }
}

pub fn codec_for(id: CodecId) -> &'static dyn BlobCodec {
    match id {
        CodecId::Store => &store::Store,
        CodecId::Zlib => &zlib::ZlibCodec,
    }
}

pub mod store;
pub mod zlib;
