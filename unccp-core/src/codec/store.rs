use super::{BlobCodec, CodecId};
use crate::error::Result;

pub struct Store;

impl BlobCodec for Store {
    fn id(&self) -> CodecId {
        CodecId::Store
    }

    fn decode(&self, src: &[u8]) -> Result<Vec<u8>> {
        Ok(src.to_vec())
    }
}
