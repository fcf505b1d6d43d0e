//! Shape expected by the downstream video re-synthesis model.

use crate::error::ResampleError;
use std::fmt;
use std::str::FromStr;

/// Frames per clip the model consumes.
pub const INFERENCE_FRAME_COUNT: usize = 81;

/// Frame size the model consumes.
pub const INFERENCE_RESOLUTION: Resolution = Resolution {
    width: 832,
    height: 480,
};

/// A frame size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ResampleError;

    /// Parses `WIDTHxHEIGHT` (also accepts `X` and `:` as separators).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ResampleError::InvalidResolution(format!(
                "expected WIDTHxHEIGHT with non-zero sides, got '{s}'"
            ))
        };
        let (w, h) = s
            .trim()
            .split_once(['x', 'X', ':'])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}
