use crate::codec::{CodecId, codec_for, looks_like_zlib};
use crate::container::pyc::{self, PyVersion, PycHeader};
use crate::error::{Result, UnccpError};
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct NormalizeOptions {
    /// Release used to synthesize a header for bare marshalled code objects.
    pub assume_version: Option<PyVersion>,
}

/// A blob rewritten into a plain `.pyc` image.
#[derive(Clone, Debug)]
pub struct NormalizedBlob {
    pub codec: CodecId,
    pub version: PyVersion,
    /// True when the header was synthesized rather than read from the blob.
    pub synthesized_header: bool,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    opts: NormalizeOptions,
}

impl Normalizer {
    pub fn new(opts: NormalizeOptions) -> Self {
        Self { opts }
    }

    pub fn normalize(&self, raw: &[u8]) -> Result<NormalizedBlob> {
        let codec = if pyc::has_magic(raw) {
            CodecId::Store
        } else if looks_like_zlib(raw) {
            CodecId::Zlib
        } else if raw.is_empty() {
            return Err(UnccpError::UnrecognizedFormat("empty blob".to_string()));
        } else {
            return Err(UnccpError::UnrecognizedFormat(format!(
                "blob starts with {}, neither zlib nor pyc",
                hex_prefix(raw)
            )));
        };

        let dec = codec_for(codec);
        let image = dec.decode(raw)?;
        debug!(codec = ?dec.id(), raw = raw.len(), image = image.len(), "blob decoded");

        if !pyc::has_magic(&image) && image.first().copied().is_some_and(pyc::is_code_marker) {
            return self.with_synthesized_header(codec, image);
        }

        let hdr = PycHeader::parse(&image)?;
        Ok(NormalizedBlob {
            codec,
            version: hdr.version,
            synthesized_header: false,
            bytes: image,
        })
    }

    fn with_synthesized_header(&self, codec: CodecId, body: Vec<u8>) -> Result<NormalizedBlob> {
        let version = self.opts.assume_version.ok_or_else(|| {
            UnccpError::UnrecognizedFormat(
                "headerless code object and no python version assumed".to_string(),
            )
        })?;
        let hdr = PycHeader::for_version(version).ok_or_else(|| {
            UnccpError::UnrecognizedFormat(format!("no pyc header known for python {version}"))
        })?;
        let mut bytes = Vec::with_capacity(hdr.len() + body.len());
        hdr.write_to(&mut bytes)?;
        bytes.extend_from_slice(&body);
        Ok(NormalizedBlob {
            codec,
            version,
            synthesized_header: true,
            bytes,
        })
    }
}

fn hex_prefix(b: &[u8]) -> String {
    b.iter().take(4).map(|x| format!("{x:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn pyc27(body: &[u8]) -> Vec<u8> {
        let mut v = vec![0x03, 0xf3, 0x0d, 0x0a, 0, 0, 0, 0];
        v.extend_from_slice(body);
        v
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn zlib_wrapped_pyc_is_inflated() {
        let image = pyc27(b"c\0\0\0\0payload");
        let blob = Normalizer::default().normalize(&zlib(&image)).unwrap();
        assert_eq!(blob.codec, CodecId::Zlib);
        assert_eq!(blob.version, PyVersion::new(2, 7));
        assert!(!blob.synthesized_header);
        assert_eq!(blob.bytes, image);
    }

    #[test]
    fn bare_pyc_passes_through() {
        let image = pyc27(b"c1234");
        let blob = Normalizer::default().normalize(&image).unwrap();
        assert_eq!(blob.codec, CodecId::Store);
        assert_eq!(blob.bytes, image);
    }

    #[test]
    fn garbage_is_unrecognized() {
        let err = Normalizer::default().normalize(b"not a blob").unwrap_err();
        assert!(matches!(err, UnccpError::UnrecognizedFormat(_)));
        let err = Normalizer::default().normalize(b"").unwrap_err();
        assert!(matches!(err, UnccpError::UnrecognizedFormat(_)));
    }

    #[test]
    fn zlib_of_non_pyc_is_unrecognized() {
        let err = Normalizer::default()
            .normalize(&zlib(b"print('hi')"))
            .unwrap_err();
        assert!(matches!(err, UnccpError::UnrecognizedFormat(_)));
    }

    #[test]
    fn headerless_code_needs_assumed_version() {
        let body = zlib(b"c\0\0\0\0body");
        assert!(Normalizer::default().normalize(&body).is_err());

        let n = Normalizer::new(NormalizeOptions {
            assume_version: Some(PyVersion::new(2, 7)),
        });
        let blob = n.normalize(&body).unwrap();
        assert!(blob.synthesized_header);
        assert_eq!(blob.bytes, pyc27(b"c\0\0\0\0body"));
    }
}
