use opencv::{
    core::{self, Mat, Rect, Scalar, Vec3b},
    imgproc,
    prelude::*,
};

/// Dry soil: ExG of exactly zero.
pub const BROWN: (f64, f64, f64) = (40.0, 80.0, 120.0);
/// Leaf green: ExG 240, hue 60, saturation 191, value 160.
pub const LEAF_GREEN: (f64, f64, f64) = (40.0, 160.0, 40.0);

fn scalar(bgr: (f64, f64, f64)) -> Scalar {
    Scalar::new(bgr.0, bgr.1, bgr.2, 0.0)
}

pub fn field(width: i32, height: i32) -> Mat {
    Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, scalar(BROWN))
        .expect("allocate synthetic field")
}

/// Brown field with a solid leaf-green patch at every rectangle.
pub fn field_with_patches(width: i32, height: i32, patches: &[Rect]) -> Mat {
    let mut frame = field(width, height);
    for patch in patches {
        imgproc::rectangle(&mut frame, *patch, scalar(LEAF_GREEN), -1, imgproc::LINE_8, 0)
            .expect("paint patch");
    }
    frame
}

/// Deterministic high-frequency colour pattern covering the full 8-bit range.
pub fn textured_field(width: i32, height: i32) -> Mat {
    let mut frame = field(width, height);
    for y in 0..height {
        let row = frame.at_row_mut::<Vec3b>(y).expect("row");
        for (x, pixel) in row.iter_mut().enumerate() {
            let x = x as i32;
            pixel.0[0] = ((x * 37 + y * 11) % 256) as u8;
            pixel.0[1] = ((x * 5 + y * 53 + 91) % 256) as u8;
            pixel.0[2] = ((x * 17 + y * 29 + 200) % 256) as u8;
        }
    }
    frame
}
