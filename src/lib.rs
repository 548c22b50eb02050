//! Owned Direct3D 11 textures and views.
//!
//! [`Texture2D`] bundles a texture with its shader-resource and/or
//! unordered-access view and the descriptors they were created from, so the
//! whole set can be rebuilt on resize. [`Texture2DView`] binds an
//! unordered-access view to a texture owned by someone else.
//!
//! # Modules
//!
//! - `format` - byte footprint of DXGI formats
//! - `layout` - mip chains, subresource pitches and upload planning
//! - `desc` - D3D11 descriptor helpers (Windows)
//! - `device` - device creation, immediate context, mip generation (Windows)
//! - `texture` / `view` - the owning types (Windows)
//!
//! The native modules only exist on Windows; the bookkeeping modules build
//! everywhere.

pub mod error;
pub mod format;
pub mod layout;

#[cfg(windows)]
pub mod desc;
#[cfg(windows)]
pub mod device;
#[cfg(windows)]
mod texture;
#[cfg(windows)]
mod view;

pub use error::{Result, TextureError};
pub use format::{texel_layout, TexelLayout};
pub use layout::{
    resolve_mip_levels, ResourceCaps, SubresourceFootprint, TextureExtent, TextureLayout,
    UploadPlan,
};

#[cfg(windows)]
pub use texture::Texture2D;
#[cfg(windows)]
pub use view::Texture2DView;
