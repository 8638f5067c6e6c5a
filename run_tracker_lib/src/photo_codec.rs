//! Photo payloads are stored as base64 data URIs cut into fixed-size
//! string chunks, so no single stored field grows past the chunk size.
//! Nothing is compressed.

use std::num::NonZeroUsize;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::TrackerError;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoCodec {
    chunk_size: NonZeroUsize,
}

impl Default for PhotoCodec {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl PhotoCodec {
    pub fn new(chunk_size: usize) -> Result<Self, TrackerError> {
        NonZeroUsize::new(chunk_size)
            .map(|chunk_size| Self { chunk_size })
            .ok_or(TrackerError::ZeroChunkSize)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Encode raw image bytes as a data URI split into ordered chunks.
    pub fn encode(&self, image_bytes: &[u8]) -> Vec<String> {
        chunk_string(&to_data_uri(image_bytes), self.chunk_size.get())
    }

    /// Reassemble the data URI from its chunks.
    pub fn decode(&self, chunks: &[String]) -> String {
        chunks.concat()
    }

    /// Reassemble the chunks and recover the original image bytes.
    pub fn decode_image(&self, chunks: &[String]) -> Result<Vec<u8>, TrackerError> {
        from_data_uri(&self.decode(chunks))
    }
}

/// Split `s` into pieces of at most `length` characters. An empty string
/// yields no chunks.
pub fn chunk_string(s: &str, length: usize) -> Vec<String> {
    let length = length.max(1);
    let mut chunks = Vec::with_capacity(s.len().div_ceil(length));
    let mut current = String::with_capacity(length);
    let mut count = 0;

    for c in s.chars() {
        current.push(c);
        count += 1;
        if count == length {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

pub fn to_data_uri(image_bytes: &[u8]) -> String {
    format!("data:{}{}{}", sniff_mime(image_bytes), BASE64_MARKER, STANDARD.encode(image_bytes))
}

pub fn from_data_uri(uri: &str) -> Result<Vec<u8>, TrackerError> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(TrackerError::CorruptPhoto("missing data: prefix".into()));
    };

    let Some((_, payload)) = rest.split_once(BASE64_MARKER) else {
        return Err(TrackerError::CorruptPhoto("missing base64 marker".into()));
    };

    STANDARD
        .decode(payload)
        .map_err(|err| TrackerError::CorruptPhoto(err.to_string()))
}

/// Guess the mime type from the leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn round_trips_arbitrary_payloads() {
        let codec = PhotoCodec::new(7).unwrap();
        let payloads: Vec<Vec<u8>> = vec![
            Vec::new(),
            vec![0],
            JPEG_HEADER.to_vec(),
            (0..=255).collect(),
            (0..5000u32).map(|i| (i * 31 % 251) as u8).collect(),
        ];

        for payload in payloads {
            let chunks = codec.encode(&payload);
            assert_eq!(codec.decode_image(&chunks).unwrap(), payload);
            assert_eq!(codec.decode(&chunks), to_data_uri(&payload));
        }
    }

    #[test]
    fn chunk_count_and_lengths_are_bounded() {
        for (len, size) in [(0, 3), (1, 3), (3, 3), (4, 3), (100, 100), (101, 100), (250, 1)] {
            let s = "x".repeat(len);
            let chunks = chunk_string(&s, size);
            assert_eq!(chunks.len(), len.div_ceil(size));
            assert!(chunks.iter().all(|c| c.len() <= size));
            assert_eq!(chunks.concat().len(), len);
        }
    }

    #[test]
    fn default_codec_uses_hundred_char_chunks() {
        let codec = PhotoCodec::default();
        let image = vec![7u8; 300];
        let uri = to_data_uri(&image);
        let chunks = codec.encode(&image);

        assert_eq!(codec.chunk_size(), 100);
        assert_eq!(chunks.len(), uri.len().div_ceil(100));
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.len() == 100));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert_eq!(PhotoCodec::new(0), Err(TrackerError::ZeroChunkSize));
    }

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_mime(&JPEG_HEADER), "image/jpeg");
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(sniff_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b"hello"), "application/octet-stream");
        assert!(to_data_uri(&JPEG_HEADER).starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn malformed_uris_are_corrupt() {
        let codec = PhotoCodec::default();
        assert!(codec.decode_image(&["not a uri".to_string()]).is_err());
        assert!(codec.decode_image(&["data:image/png,plain".to_string()]).is_err());
        assert!(codec.decode_image(&["data:image/png;base64,@@@".to_string()]).is_err());
    }
}
