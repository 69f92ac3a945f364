use opencv::core::{self, Size};
use opencv::imgproc::{MORPH_CROSS, MORPH_ELLIPSE, MORPH_RECT};
use opencv::{Error, Result};

/// Largest hue OpenCV produces for 8-bit HSV images (degrees / 2).
pub const HUE_MAX: u8 = 180;

/// Inclusive `[low, high]` window on an 8-bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub low: u8,
    pub high: u8,
}

impl Bounds {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }
}

/// How the binary vegetation mask is derived from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MaskStrategy {
    /// ExG clipped to the index window, then adaptive Gaussian thresholding.
    IndexOnly,
    /// ExG range mask intersected with hue, saturation and brightness range masks.
    IndexAndColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KernelShape {
    Rect,
    Cross,
    Ellipse,
}

impl KernelShape {
    pub(crate) fn morph_shape(self) -> i32 {
        match self {
            KernelShape::Rect => MORPH_RECT,
            KernelShape::Cross => MORPH_CROSS,
            KernelShape::Ellipse => MORPH_ELLIPSE,
        }
    }
}

/// Every threshold the detection pipeline reads. Built once per run and
/// passed by reference to each stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub strategy: MaskStrategy,
    pub index: Bounds,
    pub hue: Bounds,
    pub saturation: Bounds,
    pub brightness: Bounds,
    /// Select hues outside `hue` instead of inside it.
    pub invert_hue: bool,
    /// Regions must have an area strictly greater than this.
    pub min_detection_area: f64,
    pub block_size: i32,
    pub c: f64,
    pub kernel_shape: KernelShape,
    pub kernel_size: i32,
    pub close_iterations: i32,
    pub label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: MaskStrategy::IndexOnly,
            index: Bounds::new(30, 250),
            hue: Bounds::new(30, 90),
            saturation: Bounds::new(30, 255),
            brightness: Bounds::new(5, 200),
            invert_hue: false,
            min_detection_area: 100.0,
            block_size: 31,
            c: 2.0,
            kernel_shape: KernelShape::Ellipse,
            kernel_size: 3,
            close_iterations: 1,
            label: "WEED".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        check_bounds("index", self.index)?;
        check_bounds("hue", self.hue)?;
        check_bounds("saturation", self.saturation)?;
        check_bounds("brightness", self.brightness)?;
        if self.hue.high > HUE_MAX {
            return Err(bad_arg(format!(
                "hue upper bound {} exceeds {}",
                self.hue.high, HUE_MAX
            )));
        }
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(bad_arg(format!(
                "adaptive block size must be odd and >= 3, got {}",
                self.block_size
            )));
        }
        if self.kernel_size < 1 {
            return Err(bad_arg(format!(
                "kernel size must be positive, got {}",
                self.kernel_size
            )));
        }
        if self.close_iterations < 0 {
            return Err(bad_arg(format!(
                "closing iterations must not be negative, got {}",
                self.close_iterations
            )));
        }
        if !self.min_detection_area.is_finite() || self.min_detection_area < 0.0 {
            return Err(bad_arg(format!(
                "minimum detection area must be a non-negative number, got {}",
                self.min_detection_area
            )));
        }
        Ok(())
    }

    pub fn kernel_size(&self) -> Size {
        Size::new(self.kernel_size, self.kernel_size)
    }
}

fn check_bounds(name: &str, bounds: Bounds) -> Result<()> {
    if bounds.low > bounds.high {
        return Err(bad_arg(format!(
            "{} lower bound {} is above upper bound {}",
            name, bounds.low, bounds.high
        )));
    }
    Ok(())
}

fn bad_arg(message: String) -> Error {
    Error::new(core::StsBadArg, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn even_block_size_is_rejected() {
        let config = PipelineConfig {
            block_size: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = PipelineConfig {
            saturation: Bounds::new(200, 100),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn hue_above_opencv_range_is_rejected() {
        let config = PipelineConfig {
            hue: Bounds::new(30, 200),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
