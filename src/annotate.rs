use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    Result,
};

use crate::regions::Detection;

const BOX_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);
const LABEL_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);
const LINE_THICKNESS: i32 = 2;
const LABEL_OFFSET: i32 = 30;

fn bgr(color: (f64, f64, f64)) -> Scalar {
    Scalar::new(color.0, color.1, color.2, 0.0)
}

/// Returns a copy of `frame` with every detection boxed and labelled. The
/// input frame is left untouched.
pub fn annotate(frame: &Mat, detections: &[Detection]) -> Result<Mat> {
    let mut output = frame.try_clone()?;
    for detection in detections {
        imgproc::rectangle(
            &mut output,
            detection.bbox,
            bgr(BOX_COLOR),
            LINE_THICKNESS,
            LINE_8,
            0,
        )?;
        imgproc::put_text(
            &mut output,
            &detection.label,
            Point::new(detection.bbox.x, detection.bbox.y + LABEL_OFFSET),
            FONT_HERSHEY_SIMPLEX,
            1.0,
            bgr(LABEL_COLOR),
            LINE_THICKNESS,
            LINE_8,
            false,
        )?;
    }
    Ok(output)
}
