//! Unordered-access views over textures owned elsewhere.

use tracing::debug;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11Texture2D, ID3D11UnorderedAccessView, D3D11_UNORDERED_ACCESS_VIEW_DESC,
};

use crate::device::create_unordered_access_view;
use crate::error::Result;

/// A UAV bound to a texture the caller owns.
///
/// When the caller replaces its texture (typically a swap chain buffer after
/// a resize), [`Texture2DView::resize`] rebinds the view with the same
/// descriptor.
pub struct Texture2DView {
    desc: D3D11_UNORDERED_ACCESS_VIEW_DESC,
    unordered_access_view: ID3D11UnorderedAccessView,
}

impl Texture2DView {
    pub fn new(
        device: &ID3D11Device,
        texture: &ID3D11Texture2D,
        desc: &D3D11_UNORDERED_ACCESS_VIEW_DESC,
    ) -> Result<Self> {
        let unordered_access_view = create_unordered_access_view(device, texture, desc)?;
        debug!(format = desc.Format.0, "Created texture view");

        Ok(Self {
            desc: *desc,
            unordered_access_view,
        })
    }

    /// Rebind the view to `texture`. The old view survives a failure.
    pub fn resize(&mut self, device: &ID3D11Device, texture: &ID3D11Texture2D) -> Result<()> {
        self.unordered_access_view = create_unordered_access_view(device, texture, &self.desc)?;
        debug!(format = self.desc.Format.0, "Rebound texture view");
        Ok(())
    }

    pub fn unordered_access_view(&self) -> &ID3D11UnorderedAccessView {
        &self.unordered_access_view
    }

    pub fn desc(&self) -> &D3D11_UNORDERED_ACCESS_VIEW_DESC {
        &self.desc
    }
}
