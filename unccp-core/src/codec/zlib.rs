use super::{BlobCodec, CodecId};
use crate::error::{Result, UnccpError};
use flate2::{Decompress, FlushDecompress, Status};

/// Inflated output may be at most this many times the compressed size...
pub const MAX_INFLATE_RATIO: usize = 256;
/// ...but never capped below this floor or allowed above this ceiling.
pub const MIN_INFLATE_LIMIT: usize = 1 << 20;
pub const MAX_INFLATE_LIMIT: usize = 256 << 20;

pub fn inflate_limit(compressed_len: usize) -> usize {
    compressed_len
        .saturating_mul(MAX_INFLATE_RATIO)
        .clamp(MIN_INFLATE_LIMIT, MAX_INFLATE_LIMIT)
}

pub struct ZlibCodec;

impl BlobCodec for ZlibCodec {
    fn id(&self) -> CodecId {
        CodecId::Zlib
    }

    fn decode(&self, src: &[u8]) -> Result<Vec<u8>> {
        let limit = inflate_limit(src.len());
        let mut d = Decompress::new(true);
        // marshalled code inflates to a few times the stored size
        let mut out = Vec::with_capacity(src.len().saturating_mul(3).clamp(64, limit));
        loop {
            if out.len() == out.capacity() {
                if out.len() >= limit {
                    return Err(UnccpError::UnrecognizedFormat(format!(
                        "zlib stream inflates past {limit} bytes"
                    )));
                }
                out.reserve(out.capacity().min(limit - out.len()));
            }
            let in_before = d.total_in();
            let out_before = d.total_out();
            let status = d
                .decompress_vec(&src[in_before as usize..], &mut out, FlushDecompress::Finish)
                .map_err(|e| UnccpError::UnrecognizedFormat(format!("zlib inflate failed: {e}")))?;
            if status == Status::StreamEnd {
                return Ok(out);
            }
            let has_room = out.len() < out.capacity();
            let stalled = d.total_in() == in_before && d.total_out() == out_before;
            if has_room && (stalled || d.total_in() as usize == src.len()) {
                return Err(UnccpError::UnrecognizedFormat(
                    "zlib stream is truncated".to_string(),
                ));
            }
        }
    }
}
