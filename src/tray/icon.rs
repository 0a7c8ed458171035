//! Icon management for tray application

use anyhow::{Context, Result};
use image::GenericImageView;
use std::path::Path;
use tray_icon::Icon;
use tracing::warn;

const FALLBACK_SIZE: u32 = 32;

/// Icons for the running and stopped server states
pub struct IconManager {
    running_icon: Icon,
    stopped_icon: Icon,
}

impl IconManager {
    /// Load the bundled icon; the stopped variant is a greyed-out copy
    ///
    /// A plain generated icon is used when the file is missing or unreadable.
    pub fn new(icon_path: &Path) -> Result<Self> {
        let (rgba, width, height) = match Self::load_rgba(icon_path) {
            Ok(image) => image,
            Err(e) => {
                warn!("{:#}; using built-in icon", e);
                Self::fallback_rgba()
            }
        };

        let stopped = Self::desaturate(&rgba);
        Ok(Self {
            running_icon: Icon::from_rgba(rgba, width, height)?,
            stopped_icon: Icon::from_rgba(stopped, width, height)?,
        })
    }

    fn load_rgba(path: &Path) -> Result<(Vec<u8>, u32, u32)> {
        let img =
            image::open(path).with_context(|| format!("Failed to load icon: {:?}", path))?;
        let (width, height) = img.dimensions();
        Ok((img.into_rgba8().into_raw(), width, height))
    }

    fn fallback_rgba() -> (Vec<u8>, u32, u32) {
        let rgba = [0x1e, 0x88, 0xe5, 0xff].repeat((FALLBACK_SIZE * FALLBACK_SIZE) as usize);
        (rgba, FALLBACK_SIZE, FALLBACK_SIZE)
    }

    fn desaturate(rgba: &[u8]) -> Vec<u8> {
        rgba.chunks_exact(4)
            .flat_map(|px| {
                let luma =
                    ((px[0] as u32 * 30 + px[1] as u32 * 59 + px[2] as u32 * 11) / 100) as u8;
                [luma, luma, luma, px[3] / 2]
            })
            .collect()
    }

    /// Get icon for the running server
    pub fn running_icon(&self) -> Icon {
        self.running_icon.clone()
    }

    /// Get icon for the stopped server
    pub fn stopped_icon(&self) -> Icon {
        self.stopped_icon.clone()
    }
}
