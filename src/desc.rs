//! Bridges between D3D11 descriptors and the portable layout model.

use windows::Win32::Graphics::Direct3D::{
    D3D_SRV_DIMENSION_TEXTURE2D, D3D_SRV_DIMENSION_TEXTURE2DARRAY,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_FLAG, D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE,
    D3D11_BIND_UNORDERED_ACCESS, D3D11_RESOURCE_MISC_GENERATE_MIPS,
    D3D11_SHADER_RESOURCE_VIEW_DESC, D3D11_SHADER_RESOURCE_VIEW_DESC_0, D3D11_TEX2D_ARRAY_SRV,
    D3D11_TEX2D_ARRAY_UAV, D3D11_TEX2D_SRV, D3D11_TEX2D_UAV, D3D11_TEXTURE2D_DESC,
    D3D11_UAV_DIMENSION_TEXTURE2D, D3D11_UAV_DIMENSION_TEXTURE2DARRAY,
    D3D11_UNORDERED_ACCESS_VIEW_DESC, D3D11_UNORDERED_ACCESS_VIEW_DESC_0, D3D11_USAGE_IMMUTABLE,
};

use crate::error::Result;
use crate::layout::{ResourceCaps, TextureExtent, TextureLayout};

fn bound_as(desc: &D3D11_TEXTURE2D_DESC, flag: D3D11_BIND_FLAG) -> bool {
    desc.BindFlags & flag.0 as u32 != 0
}

pub fn extent_of(desc: &D3D11_TEXTURE2D_DESC) -> TextureExtent {
    TextureExtent::new(desc.Width, desc.Height)
}

pub fn layout_of(desc: &D3D11_TEXTURE2D_DESC) -> Result<TextureLayout> {
    TextureLayout::new(extent_of(desc), desc.MipLevels, desc.ArraySize, desc.Format.0)
}

pub fn caps_of(desc: &D3D11_TEXTURE2D_DESC) -> ResourceCaps {
    ResourceCaps {
        shader_resource: bound_as(desc, D3D11_BIND_SHADER_RESOURCE),
        unordered_access: bound_as(desc, D3D11_BIND_UNORDERED_ACCESS),
        render_target: bound_as(desc, D3D11_BIND_RENDER_TARGET),
        generate_mips: desc.MiscFlags & D3D11_RESOURCE_MISC_GENERATE_MIPS.0 as u32 != 0,
        immutable: desc.Usage == D3D11_USAGE_IMMUTABLE,
    }
}

/// SRV over the whole texture: every mip level, every array slice.
///
/// Uses "all remaining levels" rather than a fixed count so the descriptor
/// stays valid when a full-chain texture is resized.
pub fn default_shader_resource_view_desc(
    desc: &D3D11_TEXTURE2D_DESC,
) -> D3D11_SHADER_RESOURCE_VIEW_DESC {
    let mip_levels = if desc.MipLevels == 0 {
        u32::MAX
    } else {
        desc.MipLevels
    };

    if desc.ArraySize > 1 {
        D3D11_SHADER_RESOURCE_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: D3D_SRV_DIMENSION_TEXTURE2DARRAY,
            Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2DArray: D3D11_TEX2D_ARRAY_SRV {
                    MostDetailedMip: 0,
                    MipLevels: mip_levels,
                    FirstArraySlice: 0,
                    ArraySize: desc.ArraySize,
                },
            },
        }
    } else {
        D3D11_SHADER_RESOURCE_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: D3D_SRV_DIMENSION_TEXTURE2D,
            Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_SRV {
                    MostDetailedMip: 0,
                    MipLevels: mip_levels,
                },
            },
        }
    }
}

/// UAV over one mip level of every array slice.
pub fn default_unordered_access_view_desc(
    desc: &D3D11_TEXTURE2D_DESC,
    mip_slice: u32,
) -> D3D11_UNORDERED_ACCESS_VIEW_DESC {
    if desc.ArraySize > 1 {
        D3D11_UNORDERED_ACCESS_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: D3D11_UAV_DIMENSION_TEXTURE2DARRAY,
            Anonymous: D3D11_UNORDERED_ACCESS_VIEW_DESC_0 {
                Texture2DArray: D3D11_TEX2D_ARRAY_UAV {
                    MipSlice: mip_slice,
                    FirstArraySlice: 0,
                    ArraySize: desc.ArraySize,
                },
            },
        }
    } else {
        D3D11_UNORDERED_ACCESS_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: D3D11_UAV_DIMENSION_TEXTURE2D,
            Anonymous: D3D11_UNORDERED_ACCESS_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_UAV {
                    MipSlice: mip_slice,
                },
            },
        }
    }
}
