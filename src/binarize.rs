use opencv::{
    core::{self, Mat, Scalar},
    imgproc::{self, ADAPTIVE_THRESH_GAUSSIAN_C, THRESH_BINARY_INV},
    prelude::*,
    Error, Result,
};

use crate::config::{Bounds, PipelineConfig};
use crate::index::IndexMap;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Single-channel mask whose cells are either 0 or 255.
#[derive(Debug)]
pub struct Mask(Mat);

impl Mask {
    /// Wraps an existing 8-bit single-channel matrix, rejecting any cell that
    /// is not 0 or 255.
    pub fn from_mat(mat: Mat) -> Result<Self> {
        if mat.typ() != core::CV_8UC1 {
            return Err(Error::new(
                core::StsUnsupportedFormat,
                format!("mask must be 8-bit single channel, got type {}", mat.typ()),
            ));
        }
        for row in 0..mat.rows() {
            if let Some(value) = mat
                .at_row::<u8>(row)?
                .iter()
                .find(|v| **v != FOREGROUND && **v != BACKGROUND)
            {
                return Err(Error::new(
                    core::StsBadArg,
                    format!("mask value {} at row {} is not binary", value, row),
                ));
            }
        }
        Ok(Self(mat))
    }

    /// Trusted constructor for stage outputs that are binary by construction.
    pub(crate) fn wrap(mat: Mat) -> Self {
        Self(mat)
    }

    pub fn as_mat(&self) -> &Mat {
        &self.0
    }

    pub fn into_mat(self) -> Mat {
        self.0
    }

    pub fn is_foreground(&self, row: i32, col: i32) -> Result<bool> {
        Ok(*self.0.at_2d::<u8>(row, col)? == FOREGROUND)
    }

    pub fn foreground_count(&self) -> Result<i32> {
        core::count_non_zero(&self.0)
    }

    /// Cell-wise logical AND.
    pub fn intersect(&self, other: &Mask) -> Result<Mask> {
        let mut out = Mat::default();
        core::bitwise_and_def(&self.0, &other.0, &mut out)?;
        Ok(Mask(out))
    }

    /// Cell-wise logical NOT.
    pub fn complement(&self) -> Result<Mask> {
        let mut out = Mat::default();
        core::bitwise_not_def(&self.0, &mut out)?;
        Ok(Mask(out))
    }
}

/// Foreground wherever `channel` lies inside the inclusive `bounds`.
pub fn range_mask(channel: &Mat, bounds: Bounds) -> Result<Mask> {
    let mut out = Mat::default();
    core::in_range(
        channel,
        &Scalar::all(bounds.low as f64),
        &Scalar::all(bounds.high as f64),
        &mut out,
    )?;
    Ok(Mask(out))
}

/// Saturates the index map into `bounds`. Unlike [`range_mask`] the result
/// keeps intensities, so it can still be thresholded.
pub fn clip(index: &IndexMap, bounds: Bounds) -> Result<IndexMap> {
    let raised = core::max_mat_f64(index.as_mat(), bounds.low as f64)?.to_mat()?;
    let clipped = core::min_mat_f64(&raised, bounds.high as f64)?.to_mat()?;
    Ok(IndexMap::wrap(clipped))
}

/// Inverted Gaussian adaptive threshold: a cell is foreground when its value
/// is at or below the Gaussian-weighted mean of its `block_size` neighbourhood
/// minus `c`.
pub fn adaptive_binarize(index: &IndexMap, config: &PipelineConfig) -> Result<Mask> {
    let mut out = Mat::default();
    imgproc::adaptive_threshold(
        index.as_mat(),
        &mut out,
        FOREGROUND as f64,
        ADAPTIVE_THRESH_GAUSSIAN_C,
        THRESH_BINARY_INV,
        config.block_size,
        config.c,
    )?;
    Ok(Mask(out))
}
