use opencv::{
    core::{Mat, Point, BORDER_CONSTANT},
    imgproc::{self, MORPH_CLOSE},
    prelude::*,
    Result,
};

use crate::binarize::Mask;
use crate::config::PipelineConfig;

pub fn structuring_element(config: &PipelineConfig) -> Result<Mat> {
    imgproc::get_structuring_element(
        config.kernel_shape.morph_shape(),
        config.kernel_size(),
        Point::new(-1, -1),
    )
}

/// Morphological closing (dilate then erode) repeated `close_iterations` times.
pub fn close(mask: &Mask, config: &PipelineConfig) -> Result<Mask> {
    if config.close_iterations == 0 {
        return Ok(Mask::wrap(mask.as_mat().try_clone()?));
    }
    let kernel = structuring_element(config)?;
    let mut out = Mat::default();
    imgproc::morphology_ex(
        mask.as_mat(),
        &mut out,
        MORPH_CLOSE,
        &kernel,
        Point::new(-1, -1),
        config.close_iterations,
        BORDER_CONSTANT,
        imgproc::morphology_default_border_value()?,
    )?;
    Ok(Mask::wrap(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Rect, Scalar};

    fn mask_with(rects: &[Rect]) -> Mask {
        let mut mat =
            Mat::new_rows_cols_with_default(40, 40, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        for rect in rects {
            imgproc::rectangle(&mut mat, *rect, Scalar::all(255.0), -1, imgproc::LINE_8, 0)
                .unwrap();
        }
        Mask::from_mat(mat).unwrap()
    }

    #[test]
    fn closing_fills_a_pinhole() {
        let mask = mask_with(&[Rect::new(10, 10, 15, 15)]);
        let mut mat = mask.into_mat();
        *mat.at_2d_mut::<u8>(17, 17).unwrap() = 0;
        let holed = Mask::from_mat(mat).unwrap();

        let closed = close(&holed, &PipelineConfig::default()).unwrap();
        assert!(closed.is_foreground(17, 17).unwrap());
        assert_eq!(closed.foreground_count().unwrap(), 15 * 15);
    }

    #[test]
    fn closing_bridges_a_one_pixel_gap() {
        let mask = mask_with(&[Rect::new(5, 10, 10, 10), Rect::new(16, 10, 10, 10)]);
        let closed = close(&mask, &PipelineConfig::default()).unwrap();
        assert!(closed.is_foreground(15, 15).unwrap());
    }

    #[test]
    fn closing_keeps_solid_rectangle() {
        let mask = mask_with(&[Rect::new(8, 8, 20, 12)]);
        let closed = close(&mask, &PipelineConfig::default()).unwrap();
        assert_eq!(closed.foreground_count().unwrap(), 20 * 12);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mask = mask_with(&[Rect::new(5, 10, 10, 10), Rect::new(16, 10, 10, 10)]);
        let config = PipelineConfig {
            close_iterations: 0,
            ..Default::default()
        };
        let closed = close(&mask, &config).unwrap();
        assert!(!closed.is_foreground(15, 15).unwrap());
        assert_eq!(closed.foreground_count().unwrap(), 200);
    }
}
