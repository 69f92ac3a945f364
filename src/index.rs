use opencv::{
    core::{self, Mat, Scalar, Vec3b},
    prelude::*,
    Error, Result,
};

/// Single-channel excess-green map with the same size as its source frame.
#[derive(Debug)]
pub struct IndexMap(Mat);

impl IndexMap {
    pub(crate) fn wrap(mat: Mat) -> Self {
        Self(mat)
    }

    pub fn as_mat(&self) -> &Mat {
        &self.0
    }

    pub fn rows(&self) -> i32 {
        self.0.rows()
    }

    pub fn cols(&self) -> i32 {
        self.0.cols()
    }

    pub fn value_at(&self, row: i32, col: i32) -> Result<u8> {
        Ok(*self.0.at_2d::<u8>(row, col)?)
    }
}

/// `2G - R - B` for one pixel, clamped to `[0, 255]`.
pub fn excess_green_value(blue: u8, green: u8, red: u8) -> u8 {
    (2 * green as i32 - red as i32 - blue as i32).clamp(0, 255) as u8
}

/// Computes the excess-green index of a BGR frame.
pub fn excess_green(frame: &Mat) -> Result<IndexMap> {
    ensure_bgr(frame)?;

    let mut index = Mat::new_rows_cols_with_default(
        frame.rows(),
        frame.cols(),
        core::CV_8UC1,
        Scalar::all(0.0),
    )?;
    for row in 0..frame.rows() {
        let src = frame.at_row::<Vec3b>(row)?;
        let dst = index.at_row_mut::<u8>(row)?;
        for (pixel, value) in src.iter().zip(dst.iter_mut()) {
            *value = excess_green_value(pixel.0[0], pixel.0[1], pixel.0[2]);
        }
    }
    Ok(IndexMap(index))
}

pub(crate) fn ensure_bgr(frame: &Mat) -> Result<()> {
    if frame.empty() {
        return Err(Error::new(core::StsBadArg, "frame is empty"));
    }
    if frame.typ() != core::CV_8UC3 {
        return Err(Error::new(
            core::StsUnsupportedFormat,
            format!("expected an 8-bit 3-channel frame, got type {}", frame.typ()),
        ));
    }
    Ok(())
}
