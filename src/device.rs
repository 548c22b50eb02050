//! Device-level helpers shared by textures and views.

use tracing::trace;
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11ShaderResourceView,
    ID3D11Texture2D, ID3D11UnorderedAccessView, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
    D3D11_SDK_VERSION, D3D11_SHADER_RESOURCE_VIEW_DESC, D3D11_UNORDERED_ACCESS_VIEW_DESC,
};

use crate::error::{Result, TextureError};

/// Create a D3D11 device of the given driver type.
///
/// Pass `D3D_DRIVER_TYPE_HARDWARE` for the default adapter or
/// `D3D_DRIVER_TYPE_WARP` for the software rasteriser.
pub fn create_device(driver_type: D3D_DRIVER_TYPE) -> Result<ID3D11Device> {
    let mut device: Option<ID3D11Device> = None;

    unsafe {
        D3D11CreateDevice(
            None,
            driver_type,
            None,
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            None,
        )?;
    }

    device.ok_or(TextureError::NullResource("device"))
}

pub fn immediate_context(device: &ID3D11Device) -> Result<ID3D11DeviceContext> {
    Ok(unsafe { device.GetImmediateContext()? })
}

/// Fill every lower mip level of the view's texture from its top level.
pub fn generate_mips(device: &ID3D11Device, view: &ID3D11ShaderResourceView) -> Result<()> {
    let context = immediate_context(device)?;
    trace!("Generating mips");
    unsafe { context.GenerateMips(view) };
    Ok(())
}

pub(crate) fn create_shader_resource_view(
    device: &ID3D11Device,
    texture: &ID3D11Texture2D,
    desc: &D3D11_SHADER_RESOURCE_VIEW_DESC,
) -> Result<ID3D11ShaderResourceView> {
    let mut view = None;
    unsafe { device.CreateShaderResourceView(texture, Some(desc), Some(&mut view))? };
    view.ok_or(TextureError::NullResource("shader resource view"))
}

pub(crate) fn create_unordered_access_view(
    device: &ID3D11Device,
    texture: &ID3D11Texture2D,
    desc: &D3D11_UNORDERED_ACCESS_VIEW_DESC,
) -> Result<ID3D11UnorderedAccessView> {
    let mut view = None;
    unsafe { device.CreateUnorderedAccessView(texture, Some(desc), Some(&mut view))? };
    view.ok_or(TextureError::NullResource("unordered access view"))
}
