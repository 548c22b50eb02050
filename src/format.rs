//! Memory footprint of DXGI formats.
//!
//! Formats are identified by their raw `DXGI_FORMAT` code so this module
//! compiles on every target. On Windows pass `format.0` of a `DXGI_FORMAT`.

/// How texels of a format are laid out in system memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelLayout {
    /// One texel occupies a fixed number of bytes.
    Uncompressed { bytes_per_texel: u32 },
    /// Texels are stored in 4x4 blocks of a fixed byte size (BC1-BC7).
    BlockCompressed { bytes_per_block: u32 },
}

const BLOCK_DIM: u32 = 4;

impl TexelLayout {
    /// Bytes in one row of `width` texels (one block row for BC formats).
    ///
    /// `None` when the pitch does not fit in a `u32`.
    pub fn row_pitch(&self, width: u32) -> Option<u32> {
        match *self {
            TexelLayout::Uncompressed { bytes_per_texel } => {
                width.max(1).checked_mul(bytes_per_texel)
            }
            TexelLayout::BlockCompressed { bytes_per_block } => {
                width.max(1).div_ceil(BLOCK_DIM).checked_mul(bytes_per_block)
            }
        }
    }

    /// Number of rows the pitch is counted over.
    pub fn row_count(&self, height: u32) -> u32 {
        match self {
            TexelLayout::Uncompressed { .. } => height.max(1),
            TexelLayout::BlockCompressed { .. } => height.max(1).div_ceil(BLOCK_DIM),
        }
    }

    pub fn is_block_compressed(&self) -> bool {
        matches!(self, TexelLayout::BlockCompressed { .. })
    }
}

/// Look up the texel layout of a `DXGI_FORMAT` code.
///
/// Returns `None` for `DXGI_FORMAT_UNKNOWN`, sub-byte formats (`R1_UNORM`),
/// pair-packed video formats and anything newer than `B4G4R4A4_UNORM`.
pub fn texel_layout(format: i32) -> Option<TexelLayout> {
    let bytes_per_texel = match format {
        // R32G32B32A32_*
        1..=4 => 16,
        // R32G32B32_*
        5..=8 => 12,
        // R16G16B16A16_*, R32G32_*, R32G8X24 depth family
        9..=22 => 8,
        // R10G10B10A2_*, R11G11B10_FLOAT, R8G8B8A8_*, R16G16_*, R32_*, D24S8 family
        23..=47 => 4,
        // R8G8_*, R16_*, D16_UNORM
        48..=59 => 2,
        // R8_*, A8_UNORM
        60..=65 => 1,
        // R9G9B9E5_SHAREDEXP
        67 => 4,
        // BC1, BC4
        70..=72 | 79..=81 => return Some(TexelLayout::BlockCompressed { bytes_per_block: 8 }),
        // BC2, BC3, BC5
        73..=78 | 82..=84 => return Some(TexelLayout::BlockCompressed { bytes_per_block: 16 }),
        // B5G6R5_UNORM, B5G5R5A1_UNORM
        85 | 86 => 2,
        // B8G8R8A8/B8G8R8X8 family, R10G10B10_XR_BIAS_A2_UNORM
        87..=93 => 4,
        // BC6H, BC7
        94..=99 => return Some(TexelLayout::BlockCompressed { bytes_per_block: 16 }),
        // B4G4R4A4_UNORM
        115 => 2,
        _ => return None,
    };

    Some(TexelLayout::Uncompressed { bytes_per_texel })
}

#[cfg(test)]
mod tests {
    use super::*;

    const R32G32B32A32_FLOAT: i32 = 2;
    const R8G8B8A8_UNORM: i32 = 28;
    const R16_FLOAT: i32 = 54;
    const R8_UNORM: i32 = 61;
    const R1_UNORM: i32 = 66;
    const BC1_UNORM: i32 = 71;
    const BC7_UNORM: i32 = 98;
    const B8G8R8A8_UNORM: i32 = 87;

    #[test]
    fn uncompressed_sizes() {
        let cases = [
            (R32G32B32A32_FLOAT, 16),
            (R8G8B8A8_UNORM, 4),
            (B8G8R8A8_UNORM, 4),
            (R16_FLOAT, 2),
            (R8_UNORM, 1),
        ];
        for (format, bytes) in cases {
            assert_eq!(
                texel_layout(format),
                Some(TexelLayout::Uncompressed {
                    bytes_per_texel: bytes
                }),
                "format {format}"
            );
        }
    }

    #[test]
    fn unknown_and_packed_formats_are_rejected() {
        assert_eq!(texel_layout(0), None);
        assert_eq!(texel_layout(R1_UNORM), None);
        assert_eq!(texel_layout(68), None);
        assert_eq!(texel_layout(1000), None);
    }

    #[test]
    fn block_compressed_rounds_up_to_whole_blocks() {
        let bc1 = texel_layout(BC1_UNORM).unwrap();
        assert!(bc1.is_block_compressed());
        assert_eq!(bc1.row_pitch(256), Some(64 * 8));
        assert_eq!(bc1.row_pitch(5), Some(2 * 8));
        assert_eq!(bc1.row_count(6), 2);

        let bc7 = texel_layout(BC7_UNORM).unwrap();
        assert_eq!(bc7.row_pitch(1), Some(16));
        assert_eq!(bc7.row_count(1), 1);
    }

    #[test]
    fn pitch_never_collapses_to_zero() {
        let rgba = texel_layout(R8G8B8A8_UNORM).unwrap();
        assert_eq!(rgba.row_pitch(0), Some(4));
        assert_eq!(rgba.row_count(0), 1);
        assert_eq!(rgba.row_pitch(640), Some(2560));
    }

    #[test]
    fn oversized_rows_report_overflow() {
        let wide = texel_layout(R32G32B32A32_FLOAT).unwrap();
        assert_eq!(wide.row_pitch(u32::MAX), None);
        assert_eq!(wide.row_pitch(u32::MAX / 16), Some(u32::MAX / 16 * 16));
    }
}
