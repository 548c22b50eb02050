//! Error types for texture and view creation.

use thiserror::Error;

/// Everything that can go wrong while building or rebuilding a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    /// The DXGI format has no linear texel footprint we know how to upload.
    #[error("Unsupported DXGI format: {0}")]
    UnsupportedFormat(i32),

    #[error("Texture extent must be non-zero, got {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },

    #[error("Texture array size must be non-zero")]
    ZeroArraySize,

    #[error("Requested {requested} mip levels, a {width}x{height} texture has at most {max}")]
    TooManyMipLevels {
        requested: u32,
        max: u32,
        width: u32,
        height: u32,
    },

    /// A pitch, byte size or subresource count does not fit its integer type.
    #[error("Texture {0} overflows")]
    SizeOverflow(&'static str),

    #[error("Subresource {index} out of range, texture has {count}")]
    SubresourceOutOfRange { index: u32, count: u32 },

    /// More initial-data slices than the texture has subresources.
    #[error("Got initial data for {supplied} subresources, texture only has {expected}")]
    TooManySubresources { supplied: usize, expected: u32 },

    /// A slice of initial data is shorter than its subresource footprint.
    #[error("Initial data for subresource {subresource} is {actual} bytes, expected at least {expected}")]
    InitialDataTooSmall {
        subresource: u32,
        expected: usize,
        actual: usize,
    },

    /// Immutable textures can only be filled at creation.
    #[error("Immutable texture needs data for all {expected} subresources, got {supplied}")]
    ImmutableWithoutData { supplied: usize, expected: u32 },

    #[error("Texture is not bound as {0}")]
    MissingBindFlag(&'static str),

    /// GenerateMips needs the generate-mips misc flag plus render-target and
    /// shader-resource binding.
    #[error("Texture cannot generate mips: {0}")]
    MipGenerationUnsupported(&'static str),

    /// The device reported success but handed back no object.
    #[error("Device returned no {0}")]
    NullResource(&'static str),

    /// A native Direct3D call failed.
    #[cfg(windows)]
    #[error("Direct3D error: {0}")]
    Windows(#[from] windows::core::Error),
}

pub type Result<T> = std::result::Result<T, TextureError>;
