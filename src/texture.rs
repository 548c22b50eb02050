//! Owned 2D textures together with the views bound to them.
//!
//! A [`Texture2D`] keeps the descriptors it was built from so the texture and
//! every view over it can be rebuilt in one step when the size changes.

use std::ffi::c_void;

use tracing::{debug, warn};
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11ShaderResourceView, ID3D11Texture2D, ID3D11UnorderedAccessView,
    D3D11_SHADER_RESOURCE_VIEW_DESC, D3D11_SUBRESOURCE_DATA, D3D11_TEXTURE2D_DESC,
    D3D11_UNORDERED_ACCESS_VIEW_DESC,
};

use crate::desc::{caps_of, default_shader_resource_view_desc, extent_of, layout_of};
use crate::device::{
    create_shader_resource_view, create_unordered_access_view, generate_mips, immediate_context,
};
use crate::error::{Result, TextureError};
use crate::layout::{TextureExtent, TextureLayout, UploadPlan};

/// A texture, its optional SRV and UAV, and the descriptors behind them.
pub struct Texture2D {
    desc: D3D11_TEXTURE2D_DESC,
    shader_resource_view_desc: Option<D3D11_SHADER_RESOURCE_VIEW_DESC>,
    unordered_access_view_desc: Option<D3D11_UNORDERED_ACCESS_VIEW_DESC>,
    texture: ID3D11Texture2D,
    shader_resource_view: Option<ID3D11ShaderResourceView>,
    unordered_access_view: Option<ID3D11UnorderedAccessView>,
}

impl Texture2D {
    /// Create a texture readable from shaders.
    ///
    /// `data` holds one slice per subresource in D3D order (mip-major within
    /// each array slice). Pass a single slice to fill only the top level, or
    /// none to leave the texture uninitialised. With `generate_mipmap` the
    /// lower levels are generated from the top level after upload.
    pub fn with_shader_resource_view(
        device: &ID3D11Device,
        data: &[&[u8]],
        desc: &D3D11_TEXTURE2D_DESC,
        shader_resource_view_desc: &D3D11_SHADER_RESOURCE_VIEW_DESC,
        generate_mipmap: bool,
    ) -> Result<Self> {
        let caps = caps_of(desc);
        caps.require_shader_resource()?;
        if generate_mipmap {
            caps.require_generate_mips()?;
        }

        let texture = create_texture(device, desc, data)?;
        let shader_resource_view =
            create_shader_resource_view(device, &texture, shader_resource_view_desc)?;
        if generate_mipmap {
            generate_mips(device, &shader_resource_view)?;
        }

        debug!(
            width = desc.Width,
            height = desc.Height,
            format = desc.Format.0,
            "Created shader resource texture"
        );

        Ok(Self {
            desc: *desc,
            shader_resource_view_desc: Some(*shader_resource_view_desc),
            unordered_access_view_desc: None,
            texture,
            shader_resource_view: Some(shader_resource_view),
            unordered_access_view: None,
        })
    }

    /// Create a texture writable from shaders.
    ///
    /// If `desc` also binds the texture as a shader resource, an SRV is
    /// created from `shader_resource_view_desc`, or over the whole texture
    /// when that is `None`. Mips can only be generated through that SRV.
    pub fn with_unordered_access_view(
        device: &ID3D11Device,
        data: &[&[u8]],
        desc: &D3D11_TEXTURE2D_DESC,
        unordered_access_view_desc: &D3D11_UNORDERED_ACCESS_VIEW_DESC,
        shader_resource_view_desc: Option<&D3D11_SHADER_RESOURCE_VIEW_DESC>,
        generate_mipmap: bool,
    ) -> Result<Self> {
        let caps = caps_of(desc);
        caps.require_unordered_access()?;

        if shader_resource_view_desc.is_some() && !caps.shader_resource {
            warn!("Texture is not bound as shader resource, ignoring shader resource view desc");
        }
        let shader_resource_view_desc = caps.shader_resource.then(|| {
            shader_resource_view_desc
                .copied()
                .unwrap_or_else(|| default_shader_resource_view_desc(desc))
        });
        let generate_mipmap = if generate_mipmap && shader_resource_view_desc.is_none() {
            warn!("Texture has no shader resource view, skipping mip generation");
            false
        } else {
            generate_mipmap
        };
        if generate_mipmap {
            caps.require_generate_mips()?;
        }

        let texture = create_texture(device, desc, data)?;
        let unordered_access_view =
            create_unordered_access_view(device, &texture, unordered_access_view_desc)?;
        let shader_resource_view = shader_resource_view_desc
            .as_ref()
            .map(|view_desc| create_shader_resource_view(device, &texture, view_desc))
            .transpose()?;
        if let (true, Some(view)) = (generate_mipmap, &shader_resource_view) {
            generate_mips(device, view)?;
        }

        debug!(
            width = desc.Width,
            height = desc.Height,
            format = desc.Format.0,
            readable = shader_resource_view.is_some(),
            "Created unordered access texture"
        );

        Ok(Self {
            desc: *desc,
            shader_resource_view_desc,
            unordered_access_view_desc: Some(*unordered_access_view_desc),
            texture,
            shader_resource_view,
            unordered_access_view: Some(unordered_access_view),
        })
    }

    /// Rebuild the texture and all of its views at a new size.
    ///
    /// Contents are not preserved. Lower mips are regenerated when the
    /// texture has more than one level and supports it. On error the
    /// current texture and views are left untouched.
    pub fn resize(&mut self, device: &ID3D11Device, width: u32, height: u32) -> Result<()> {
        let mut desc = self.desc;
        desc.Width = width;
        desc.Height = height;

        let texture = create_texture(device, &desc, &[])?;
        let shader_resource_view = self
            .shader_resource_view_desc
            .as_ref()
            .map(|view_desc| create_shader_resource_view(device, &texture, view_desc))
            .transpose()?;
        let unordered_access_view = self
            .unordered_access_view_desc
            .as_ref()
            .map(|view_desc| create_unordered_access_view(device, &texture, view_desc))
            .transpose()?;

        let layout = layout_of(&desc)?;
        if let Some(view) = &shader_resource_view {
            if layout.mip_levels() > 1 && caps_of(&desc).can_generate_mips() {
                generate_mips(device, view)?;
            }
        }

        debug!(
            from_width = self.desc.Width,
            from_height = self.desc.Height,
            width,
            height,
            "Resized texture"
        );

        self.desc = desc;
        self.texture = texture;
        self.shader_resource_view = shader_resource_view;
        self.unordered_access_view = unordered_access_view;
        Ok(())
    }

    pub fn desc(&self) -> D3D11_TEXTURE2D_DESC {
        self.desc
    }

    pub fn extent(&self) -> TextureExtent {
        extent_of(&self.desc)
    }

    pub fn layout(&self) -> Result<TextureLayout> {
        layout_of(&self.desc)
    }

    pub fn texture(&self) -> &ID3D11Texture2D {
        &self.texture
    }

    pub fn shader_resource_view(&self) -> Option<&ID3D11ShaderResourceView> {
        self.shader_resource_view.as_ref()
    }

    pub fn unordered_access_view(&self) -> Option<&ID3D11UnorderedAccessView> {
        self.unordered_access_view.as_ref()
    }

    pub fn shader_resource_view_desc(&self) -> Option<&D3D11_SHADER_RESOURCE_VIEW_DESC> {
        self.shader_resource_view_desc.as_ref()
    }

    pub fn unordered_access_view_desc(&self) -> Option<&D3D11_UNORDERED_ACCESS_VIEW_DESC> {
        self.unordered_access_view_desc.as_ref()
    }
}

/// Create the texture and upload whatever data was supplied.
fn create_texture(
    device: &ID3D11Device,
    desc: &D3D11_TEXTURE2D_DESC,
    data: &[&[u8]],
) -> Result<ID3D11Texture2D> {
    let layout = layout_of(desc)?;
    let plan = layout.plan_upload(data)?;
    caps_of(desc).check_upload(plan, &layout)?;

    let initial_data = match plan {
        UploadPlan::AtCreation => data
            .iter()
            .zip(layout.footprints())
            .map(|(bytes, footprint)| -> Result<D3D11_SUBRESOURCE_DATA> {
                Ok(D3D11_SUBRESOURCE_DATA {
                    pSysMem: bytes.as_ptr() as *const c_void,
                    SysMemPitch: footprint?.row_pitch,
                    SysMemSlicePitch: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        UploadPlan::Empty | UploadPlan::AfterCreation(_) => Vec::new(),
    };

    let mut texture = None;
    unsafe {
        device.CreateTexture2D(
            desc,
            (!initial_data.is_empty()).then(|| initial_data.as_ptr()),
            Some(&mut texture),
        )?;
    }
    let texture = texture.ok_or(TextureError::NullResource("texture"))?;

    if let UploadPlan::AfterCreation(count) = plan {
        let context = immediate_context(device)?;
        for (bytes, footprint) in data.iter().zip(layout.footprints()).take(count) {
            let footprint = footprint?;
            unsafe {
                context.UpdateSubresource(
                    &texture,
                    footprint.index,
                    None,
                    bytes.as_ptr() as *const c_void,
                    footprint.row_pitch,
                    0,
                );
            }
        }
    }

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::default_unordered_access_view_desc;
    use crate::device::create_device;
    use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_WARP;
    use windows::Win32::Graphics::Direct3D11::{
        D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE, D3D11_BIND_UNORDERED_ACCESS,
        D3D11_CPU_ACCESS_READ, D3D11_MAPPED_SUBRESOURCE, D3D11_MAP_READ,
        D3D11_RESOURCE_MISC_GENERATE_MIPS, D3D11_USAGE_DEFAULT, D3D11_USAGE_IMMUTABLE,
        D3D11_USAGE_STAGING,
    };
    use windows::Win32::Graphics::Dxgi::Common::{
        DXGI_FORMAT, DXGI_FORMAT_R32_FLOAT, DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_SAMPLE_DESC,
    };

    fn texture_desc(
        width: u32,
        height: u32,
        format: DXGI_FORMAT,
        bind: i32,
    ) -> D3D11_TEXTURE2D_DESC {
        D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: format,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        }
    }

    fn native_desc(texture: &ID3D11Texture2D) -> D3D11_TEXTURE2D_DESC {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };
        desc
    }

    /// Copy the texture to a staging copy and read the 4-byte texel at (x, y).
    fn read_texel(
        device: &ID3D11Device,
        texture: &ID3D11Texture2D,
        subresource: u32,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        let mut desc = native_desc(texture);
        desc.Usage = D3D11_USAGE_STAGING;
        desc.BindFlags = 0;
        desc.CPUAccessFlags = D3D11_CPU_ACCESS_READ.0 as u32;
        desc.MiscFlags = 0;

        let mut staging = None;
        unsafe { device.CreateTexture2D(&desc, None, Some(&mut staging)).unwrap() };
        let staging = staging.unwrap();
        let context = immediate_context(device).unwrap();

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            context.CopyResource(&staging, texture);
            context
                .Map(&staging, subresource, D3D11_MAP_READ, 0, Some(&mut mapped))
                .unwrap();
            let offset = (y * mapped.RowPitch + x * 4) as usize;
            let texel = std::slice::from_raw_parts((mapped.pData as *const u8).add(offset), 4);
            let texel = [texel[0], texel[1], texel[2], texel[3]];
            context.Unmap(&staging, subresource);
            texel
        }
    }

    #[test]
    fn shader_resource_texture_from_texels() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(4, 4, DXGI_FORMAT_R8G8B8A8_UNORM, D3D11_BIND_SHADER_RESOURCE.0);
        let texels = vec![0x7fu8; 4 * 4 * 4];

        let texture = Texture2D::with_shader_resource_view(
            &device,
            &[&texels],
            &desc,
            &default_shader_resource_view_desc(&desc),
            false,
        )
        .unwrap();

        assert!(texture.shader_resource_view().is_some());
        assert!(texture.unordered_access_view().is_none());
        assert_eq!(texture.extent(), TextureExtent::new(4, 4));
    }

    #[test]
    fn generates_full_mip_chain_from_top_level() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let mut desc = texture_desc(
            8,
            8,
            DXGI_FORMAT_R8G8B8A8_UNORM,
            D3D11_BIND_SHADER_RESOURCE.0 | D3D11_BIND_RENDER_TARGET.0,
        );
        desc.MipLevels = 0;
        desc.MiscFlags = D3D11_RESOURCE_MISC_GENERATE_MIPS.0 as u32;
        let top = vec![0xffu8; 8 * 8 * 4];

        let texture = Texture2D::with_shader_resource_view(
            &device,
            &[&top],
            &desc,
            &default_shader_resource_view_desc(&desc),
            true,
        )
        .unwrap();

        assert_eq!(native_desc(texture.texture()).MipLevels, 4);
        assert_eq!(texture.layout().unwrap().mip_levels(), 4);
        assert_eq!(read_texel(&device, texture.texture(), 3, 0, 0), [0xff; 4]);
    }

    #[test]
    fn uploads_every_mip_and_slice_at_creation() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let mut desc = texture_desc(4, 4, DXGI_FORMAT_R8G8B8A8_UNORM, D3D11_BIND_SHADER_RESOURCE.0);
        desc.MipLevels = 3;
        desc.ArraySize = 2;
        let layout = layout_of(&desc).unwrap();

        // Every row of every subresource gets its own byte value.
        let subresources: Vec<Vec<u8>> = layout
            .footprints()
            .map(|footprint| {
                let footprint = footprint.unwrap();
                (0..footprint.rows)
                    .flat_map(|row| {
                        vec![(footprint.index * 16 + row) as u8; footprint.row_pitch as usize]
                    })
                    .collect()
            })
            .collect();
        let data: Vec<&[u8]> = subresources.iter().map(Vec::as_slice).collect();

        let texture = Texture2D::with_shader_resource_view(
            &device,
            &data,
            &desc,
            &default_shader_resource_view_desc(&desc),
            false,
        )
        .unwrap();

        for footprint in layout.footprints() {
            let footprint = footprint.unwrap();
            let extent = layout.extent().mip(footprint.mip_level);
            let last_row = footprint.rows - 1;
            let expected = (footprint.index * 16 + last_row) as u8;
            assert_eq!(
                read_texel(
                    &device,
                    texture.texture(),
                    footprint.index,
                    extent.width - 1,
                    last_row
                ),
                [expected; 4],
                "subresource {}",
                footprint.index
            );
        }
    }

    #[test]
    fn resize_regenerates_mip_chain() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let mut desc = texture_desc(
            8,
            8,
            DXGI_FORMAT_R8G8B8A8_UNORM,
            D3D11_BIND_SHADER_RESOURCE.0 | D3D11_BIND_RENDER_TARGET.0,
        );
        desc.MipLevels = 0;
        desc.MiscFlags = D3D11_RESOURCE_MISC_GENERATE_MIPS.0 as u32;
        let top = vec![0xffu8; 8 * 8 * 4];
        let mut texture = Texture2D::with_shader_resource_view(
            &device,
            &[&top],
            &desc,
            &default_shader_resource_view_desc(&desc),
            true,
        )
        .unwrap();

        texture.resize(&device, 16, 4).unwrap();

        assert_eq!(native_desc(texture.texture()).MipLevels, 5);
        assert_eq!(texture.layout().unwrap().mip_levels(), 5);
        assert!(texture.shader_resource_view().is_some());
        assert_eq!(texture.extent(), TextureExtent::new(16, 4));
    }

    #[test]
    fn write_only_texture_skips_mip_generation() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(8, 8, DXGI_FORMAT_R32_FLOAT, D3D11_BIND_UNORDERED_ACCESS.0);
        let unused_srv_desc = default_shader_resource_view_desc(&desc);

        let texture = Texture2D::with_unordered_access_view(
            &device,
            &[],
            &desc,
            &default_unordered_access_view_desc(&desc, 0),
            Some(&unused_srv_desc),
            true,
        )
        .unwrap();

        assert!(texture.unordered_access_view().is_some());
        assert!(texture.shader_resource_view().is_none());
        assert!(texture.shader_resource_view_desc().is_none());
    }

    #[test]
    fn mip_generation_requires_render_target() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(8, 8, DXGI_FORMAT_R8G8B8A8_UNORM, D3D11_BIND_SHADER_RESOURCE.0);

        let result = Texture2D::with_shader_resource_view(
            &device,
            &[],
            &desc,
            &default_shader_resource_view_desc(&desc),
            true,
        );
        assert!(matches!(result, Err(TextureError::MipGenerationUnsupported(_))));
    }

    #[test]
    fn unordered_access_texture_adds_srv_when_readable() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();

        let write_only = texture_desc(16, 16, DXGI_FORMAT_R32_FLOAT, D3D11_BIND_UNORDERED_ACCESS.0);
        let texture = Texture2D::with_unordered_access_view(
            &device,
            &[],
            &write_only,
            &default_unordered_access_view_desc(&write_only, 0),
            None,
            false,
        )
        .unwrap();
        assert!(texture.unordered_access_view().is_some());
        assert!(texture.shader_resource_view().is_none());

        let read_write = texture_desc(
            16,
            16,
            DXGI_FORMAT_R32_FLOAT,
            D3D11_BIND_UNORDERED_ACCESS.0 | D3D11_BIND_SHADER_RESOURCE.0,
        );
        let texture = Texture2D::with_unordered_access_view(
            &device,
            &[],
            &read_write,
            &default_unordered_access_view_desc(&read_write, 0),
            None,
            false,
        )
        .unwrap();
        assert!(texture.shader_resource_view().is_some());
        assert!(texture.shader_resource_view_desc().is_some());
    }

    #[test]
    fn missing_bind_flag_is_reported() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(4, 4, DXGI_FORMAT_R32_FLOAT, D3D11_BIND_SHADER_RESOURCE.0);

        let result = Texture2D::with_unordered_access_view(
            &device,
            &[],
            &desc,
            &default_unordered_access_view_desc(&desc, 0),
            None,
            false,
        );
        assert!(matches!(
            result,
            Err(TextureError::MissingBindFlag("unordered access"))
        ));
    }

    #[test]
    fn immutable_texture_without_data_is_rejected() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let mut desc = texture_desc(4, 4, DXGI_FORMAT_R8G8B8A8_UNORM, D3D11_BIND_SHADER_RESOURCE.0);
        desc.Usage = D3D11_USAGE_IMMUTABLE;

        let result = Texture2D::with_shader_resource_view(
            &device,
            &[],
            &desc,
            &default_shader_resource_view_desc(&desc),
            false,
        );
        assert!(matches!(result, Err(TextureError::ImmutableWithoutData { .. })));
    }

    #[test]
    fn resize_rebuilds_texture_and_views() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(
            32,
            32,
            DXGI_FORMAT_R32_FLOAT,
            D3D11_BIND_UNORDERED_ACCESS.0 | D3D11_BIND_SHADER_RESOURCE.0,
        );
        let mut texture = Texture2D::with_unordered_access_view(
            &device,
            &[],
            &desc,
            &default_unordered_access_view_desc(&desc, 0),
            None,
            false,
        )
        .unwrap();

        texture.resize(&device, 64, 16).unwrap();

        assert_eq!(texture.extent(), TextureExtent::new(64, 16));
        let native = native_desc(texture.texture());
        assert_eq!((native.Width, native.Height), (64, 16));
        assert!(texture.shader_resource_view().is_some());
        assert!(texture.unordered_access_view().is_some());
    }

    #[test]
    fn failed_resize_keeps_previous_texture() {
        let device = create_device(D3D_DRIVER_TYPE_WARP).unwrap();
        let desc = texture_desc(8, 8, DXGI_FORMAT_R8G8B8A8_UNORM, D3D11_BIND_SHADER_RESOURCE.0);
        let mut texture = Texture2D::with_shader_resource_view(
            &device,
            &[],
            &desc,
            &default_shader_resource_view_desc(&desc),
            false,
        )
        .unwrap();

        let err = texture.resize(&device, 0, 8).unwrap_err();

        assert!(matches!(err, TextureError::ZeroExtent { width: 0, height: 8 }));
        assert_eq!(texture.extent(), TextureExtent::new(8, 8));
        assert_eq!(native_desc(texture.texture()).Width, 8);
        assert!(texture.shader_resource_view().is_some());
    }
}
