//! Image detection from leading magic bytes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Image formats recognised by their file signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Webp,
}

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const TIFF_BIG_ENDIAN: &[u8] = b"MM\x00\x2A";
const TIFF_LITTLE_ENDIAN: &[u8] = b"II\x2A\x00";
// BITMAPFILEHEADER
const BMP_HEADER_LEN: usize = 14;

impl ImageFormat {
    /// Detect an image format from the first bytes of `content`.
    pub fn sniff(content: &[u8]) -> Option<Self> {
        if content.starts_with(PNG) {
            Some(ImageFormat::Png)
        } else if content.starts_with(JPEG) {
            Some(ImageFormat::Jpeg)
        } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if content.starts_with(TIFF_BIG_ENDIAN) || content.starts_with(TIFF_LITTLE_ENDIAN) {
            Some(ImageFormat::Tiff)
        } else if content.starts_with(b"RIFF") && content.get(8..12) == Some(&b"WEBP"[..]) {
            Some(ImageFormat::Webp)
        } else if content.starts_with(b"BM") && content.len() >= BMP_HEADER_LEN {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_signatures() {
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&[0x24, 0, 0, 0]);
        webp.extend_from_slice(b"WEBPVP8 ");

        let mut bmp = b"BM".to_vec();
        bmp.resize(54, 0);

        let cases: [(&[u8], ImageFormat); 9] = [
            (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0], ImageFormat::Png),
            (&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'], ImageFormat::Jpeg),
            (&[0xFF, 0xD8, 0xFF, 0xE1, 0, 0x10, b'E', b'x', b'i', b'f'], ImageFormat::Jpeg),
            (b"GIF89a\x01\x00\x01\x00", ImageFormat::Gif),
            (b"GIF87a\x01\x00\x01\x00", ImageFormat::Gif),
            (b"II\x2A\x00\x08\x00\x00\x00", ImageFormat::Tiff),
            (b"MM\x00\x2A\x00\x00\x00\x08", ImageFormat::Tiff),
            (webp.as_slice(), ImageFormat::Webp),
            (bmp.as_slice(), ImageFormat::Bmp),
        ];

        for (bytes, expected) in cases {
            assert_eq!(ImageFormat::sniff(bytes), Some(expected), "{expected}");
        }
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(ImageFormat::sniff(b""), None);
        assert_eq!(ImageFormat::sniff(b"hello world"), None);
        // RIFF container that is not WebP (e.g. WAV audio)
        assert_eq!(ImageFormat::sniff(b"RIFF\x24\x00\x00\x00WAVEfmt "), None);
        // Too short to hold a bitmap header
        assert_eq!(ImageFormat::sniff(b"BM"), None);
        // Truncated PNG signature
        assert_eq!(ImageFormat::sniff(&[0x89, b'P', b'N', b'G']), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ImageFormat::Webp).unwrap(), "\"webp\"");
        assert_eq!(ImageFormat::Jpeg.to_string(), "jpeg");
    }
}
