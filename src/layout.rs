//! Platform-neutral texture bookkeeping.
//!
//! Everything needed to decide *what* to ask the device for lives here:
//! mip chains, subresource footprints, how initial data is uploaded and
//! which operations a texture's bind flags allow.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TextureError};
use crate::format::{texel_layout, TexelLayout};

/// Width and height of a texture or one of its mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureExtent {
    pub width: u32,
    pub height: u32,
}

impl TextureExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Extent of mip `level`, each axis halved per level and clamped to 1.
    pub fn mip(&self, level: u32) -> TextureExtent {
        TextureExtent {
            width: self.width.checked_shr(level).unwrap_or(0).max(1),
            height: self.height.checked_shr(level).unwrap_or(0).max(1),
        }
    }

    /// Number of levels down to 1x1.
    pub fn full_mip_chain(&self) -> u32 {
        let largest = self.width.max(self.height).max(1);
        u32::BITS - largest.leading_zeros()
    }
}

/// Resolve a requested mip count, where 0 means the full chain.
pub fn resolve_mip_levels(extent: TextureExtent, requested: u32) -> u32 {
    if requested == 0 {
        extent.full_mip_chain()
    } else {
        requested
    }
}

/// Memory footprint of a single subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceFootprint {
    pub index: u32,
    pub mip_level: u32,
    pub array_slice: u32,
    /// Bytes between the starts of two consecutive rows.
    pub row_pitch: u32,
    /// Rows (block rows for compressed formats).
    pub rows: u32,
}

impl SubresourceFootprint {
    /// Minimum number of bytes the caller has to provide.
    pub fn byte_len(&self) -> usize {
        (self.row_pitch as usize).saturating_mul(self.rows as usize)
    }
}

/// Shape of a 2D texture (array) as far as system-memory uploads care.
///
/// Only constructed through [`TextureLayout::new`], deserialization included,
/// so every layout has a known format, a non-empty extent and a subresource
/// count and top-level byte size that fit their integer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTextureLayout")]
pub struct TextureLayout {
    extent: TextureExtent,
    mip_levels: u32,
    array_size: u32,
    /// Raw `DXGI_FORMAT` code.
    format: i32,
    #[serde(skip)]
    subresource_count: u32,
}

/// Unchecked layout as it appears in settings files.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTextureLayout {
    extent: TextureExtent,
    mip_levels: u32,
    array_size: u32,
    format: i32,
}

impl TryFrom<RawTextureLayout> for TextureLayout {
    type Error = TextureError;

    fn try_from(raw: RawTextureLayout) -> Result<Self> {
        TextureLayout::new(raw.extent, raw.mip_levels, raw.array_size, raw.format)
    }
}

impl TextureLayout {
    /// Validate a layout. `mip_levels == 0` resolves to the full chain.
    pub fn new(extent: TextureExtent, mip_levels: u32, array_size: u32, format: i32) -> Result<Self> {
        if extent.is_empty() {
            return Err(TextureError::ZeroExtent {
                width: extent.width,
                height: extent.height,
            });
        }
        if array_size == 0 {
            return Err(TextureError::ZeroArraySize);
        }
        let texels = texel_layout(format).ok_or(TextureError::UnsupportedFormat(format))?;

        let max = extent.full_mip_chain();
        let mip_levels = resolve_mip_levels(extent, mip_levels);
        if mip_levels > max {
            return Err(TextureError::TooManyMipLevels {
                requested: mip_levels,
                max,
                width: extent.width,
                height: extent.height,
            });
        }

        let subresource_count = mip_levels
            .checked_mul(array_size)
            .ok_or(TextureError::SizeOverflow("subresource count"))?;

        // Lower mips are never larger than the top level.
        let row_pitch = texels
            .row_pitch(extent.width)
            .ok_or(TextureError::SizeOverflow("row pitch"))?;
        (row_pitch as usize)
            .checked_mul(texels.row_count(extent.height) as usize)
            .ok_or(TextureError::SizeOverflow("subresource size"))?;

        Ok(Self {
            extent,
            mip_levels,
            array_size,
            format,
            subresource_count,
        })
    }

    pub fn extent(&self) -> TextureExtent {
        self.extent
    }

    /// Resolved mip count, never 0.
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn format(&self) -> i32 {
        self.format
    }

    fn texels(&self) -> Result<TexelLayout> {
        texel_layout(self.format).ok_or(TextureError::UnsupportedFormat(self.format))
    }

    pub fn subresource_count(&self) -> u32 {
        self.subresource_count
    }

    /// Footprint of subresource `index`, ordered `mip + slice * mip_levels`.
    pub fn footprint(&self, index: u32) -> Result<SubresourceFootprint> {
        if index >= self.subresource_count {
            return Err(TextureError::SubresourceOutOfRange {
                index,
                count: self.subresource_count,
            });
        }

        let texels = self.texels()?;
        let mip_level = index % self.mip_levels;
        let array_slice = index / self.mip_levels;
        let extent = self.extent.mip(mip_level);

        Ok(SubresourceFootprint {
            index,
            mip_level,
            array_slice,
            row_pitch: texels
                .row_pitch(extent.width)
                .ok_or(TextureError::SizeOverflow("row pitch"))?,
            rows: texels.row_count(extent.height),
        })
    }

    pub fn footprints(&self) -> impl Iterator<Item = Result<SubresourceFootprint>> + '_ {
        (0..self.subresource_count).map(move |index| self.footprint(index))
    }

    /// Decide how `data` (one slice per subresource, in subresource order)
    /// gets into the texture, checking every slice is large enough.
    pub fn plan_upload(&self, data: &[&[u8]]) -> Result<UploadPlan> {
        let expected = self.subresource_count();
        if data.len() > expected as usize {
            return Err(TextureError::TooManySubresources {
                supplied: data.len(),
                expected,
            });
        }

        for (bytes, footprint) in data.iter().zip(self.footprints()) {
            let footprint = footprint?;
            if bytes.len() < footprint.byte_len() {
                return Err(TextureError::InitialDataTooSmall {
                    subresource: footprint.index,
                    expected: footprint.byte_len(),
                    actual: bytes.len(),
                });
            }
        }

        let plan = match data.len() {
            0 => UploadPlan::Empty,
            n if n == expected as usize => UploadPlan::AtCreation,
            n => UploadPlan::AfterCreation(n),
        };
        trace!(?plan, subresources = expected, "Planned texture upload");
        Ok(plan)
    }
}

/// How caller-supplied texel data reaches the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPlan {
    /// No data, contents undefined.
    Empty,
    /// Every subresource supplied, passed as initial data.
    AtCreation,
    /// The first `n` subresources supplied, written after creation.
    AfterCreation(usize),
}

/// Bind, usage and misc facts that decide which views and operations apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCaps {
    pub shader_resource: bool,
    pub unordered_access: bool,
    pub render_target: bool,
    pub generate_mips: bool,
    pub immutable: bool,
}

impl ResourceCaps {
    pub fn require_shader_resource(&self) -> Result<()> {
        if self.shader_resource {
            Ok(())
        } else {
            Err(TextureError::MissingBindFlag("shader resource"))
        }
    }

    pub fn require_unordered_access(&self) -> Result<()> {
        if self.unordered_access {
            Ok(())
        } else {
            Err(TextureError::MissingBindFlag("unordered access"))
        }
    }

    pub fn require_generate_mips(&self) -> Result<()> {
        if !self.generate_mips {
            return Err(TextureError::MipGenerationUnsupported(
                "missing generate-mips misc flag",
            ));
        }
        if !self.render_target {
            return Err(TextureError::MipGenerationUnsupported(
                "not bound as render target",
            ));
        }
        if !self.shader_resource {
            return Err(TextureError::MipGenerationUnsupported(
                "not bound as shader resource",
            ));
        }
        Ok(())
    }

    pub fn can_generate_mips(&self) -> bool {
        self.require_generate_mips().is_ok()
    }

    /// Immutable textures cannot be written after creation.
    pub fn check_upload(&self, plan: UploadPlan, layout: &TextureLayout) -> Result<()> {
        if self.immutable && plan != UploadPlan::AtCreation {
            let supplied = match plan {
                UploadPlan::AfterCreation(n) => n,
                _ => 0,
            };
            return Err(TextureError::ImmutableWithoutData {
                supplied,
                expected: layout.subresource_count(),
            });
        }
        Ok(())
    }
}
