//! Connected-region extraction and the minimum-area filter.
//!
//! Regions come back in OpenCV's border-following scan order: the order in
//! which `find_contours` meets each outer boundary while scanning the mask
//! row by row. Callers must not assume a spatial or size ordering.

use opencv::{
    core::{Point, Rect, Vector},
    imgproc::{self, CHAIN_APPROX_SIMPLE, RETR_EXTERNAL},
    types::VectorOfVectorOfPoint,
    Result,
};

use crate::binarize::Mask;
use crate::config::PipelineConfig;

/// Outer boundary of one connected foreground component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Polygon area enclosed by the boundary through pixel centres.
    pub area: f64,
    pub bbox: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Rect,
    pub area: f64,
    pub label: String,
}

impl Detection {
    pub fn centre(&self) -> Point {
        Point::new(
            self.bbox.x + self.bbox.width / 2,
            self.bbox.y + self.bbox.height / 2,
        )
    }
}

pub type DetectionSet = Vec<Detection>;

/// Finds outer boundaries only; holes and anything nested inside a region are
/// not reported separately.
pub fn extract_regions(mask: &Mask) -> Result<Vec<Region>> {
    let mut contours = VectorOfVectorOfPoint::new();
    imgproc::find_contours(
        mask.as_mat(),
        &mut contours,
        RETR_EXTERNAL,
        CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;

    contours
        .iter()
        .map(|contour: Vector<Point>| {
            Ok(Region {
                area: imgproc::contour_area(&contour, false)?,
                bbox: imgproc::bounding_rect(&contour)?,
            })
        })
        .collect()
}

/// Keeps regions whose area is strictly greater than `min_area`, preserving
/// scan order.
pub fn filter_regions(regions: &[Region], min_area: f64, label: &str) -> DetectionSet {
    regions
        .iter()
        .filter(|region| region.area > min_area)
        .map(|region| Detection {
            bbox: region.bbox,
            area: region.area,
            label: label.to_string(),
        })
        .collect()
}

pub fn detect_regions(mask: &Mask, config: &PipelineConfig) -> Result<DetectionSet> {
    let regions = extract_regions(mask)?;
    Ok(filter_regions(
        &regions,
        config.min_detection_area,
        &config.label,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::{
        core::{self, Mat, Scalar},
        prelude::*,
    };

    fn mask_with(filled: &[Rect], cleared: &[Rect]) -> Mask {
        let mut mat =
            Mat::new_rows_cols_with_default(60, 80, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        for rect in filled {
            imgproc::rectangle(&mut mat, *rect, Scalar::all(255.0), -1, imgproc::LINE_8, 0)
                .unwrap();
        }
        for rect in cleared {
            imgproc::rectangle(&mut mat, *rect, Scalar::all(0.0), -1, imgproc::LINE_8, 0).unwrap();
        }
        Mask::from_mat(mat).unwrap()
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = mask_with(&[], &[]);
        assert!(extract_regions(&mask).unwrap().is_empty());
        assert!(detect_regions(&mask, &PipelineConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn square_area_runs_through_pixel_centres() {
        let mask = mask_with(&[Rect::new(10, 10, 11, 11)], &[]);
        let regions = extract_regions(&mask).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 100.0);
        assert_eq!(regions[0].bbox, Rect::new(10, 10, 11, 11));
    }

    #[test]
    fn area_equal_to_threshold_is_excluded() {
        let mask = mask_with(&[Rect::new(10, 10, 11, 11)], &[]);
        let regions = extract_regions(&mask).unwrap();
        assert!(filter_regions(&regions, 100.0, "WEED").is_empty());
        let kept = filter_regions(&regions, 99.0, "WEED");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "WEED");
        assert_eq!(kept[0].centre(), Point::new(15, 15));
    }

    #[test]
    fn nested_regions_are_not_reported() {
        // ring with a blob inside its hole
        let mask = mask_with(&[Rect::new(10, 10, 40, 40)], &[Rect::new(15, 15, 30, 30)]);
        let mut mat = mask.into_mat();
        let blob = Rect::new(25, 25, 10, 10);
        imgproc::rectangle(&mut mat, blob, Scalar::all(255.0), -1, imgproc::LINE_8, 0).unwrap();
        let mask = Mask::from_mat(mat).unwrap();

        let regions = extract_regions(&mask).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, Rect::new(10, 10, 40, 40));
    }

    #[test]
    fn separate_blobs_each_get_a_region() {
        let mask = mask_with(&[Rect::new(2, 2, 12, 12), Rect::new(40, 30, 20, 20)], &[]);
        let config = PipelineConfig::default();
        let detections = detect_regions(&mask, &config).unwrap();
        assert_eq!(detections.len(), 2);
        let mut boxes: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        boxes.sort_by_key(|r| (r.y, r.x));
        assert_eq!(boxes, vec![Rect::new(2, 2, 12, 12), Rect::new(40, 30, 20, 20)]);
    }

    #[test]
    fn raising_min_area_never_adds_detections() {
        let mask = mask_with(
            &[Rect::new(2, 2, 6, 6), Rect::new(20, 2, 12, 12), Rect::new(40, 30, 20, 20)],
            &[],
        );
        let regions = extract_regions(&mask).unwrap();
        let mut previous = usize::MAX;
        for min_area in [0.0, 24.0, 25.0, 121.0, 200.0, 361.0, 1000.0] {
            let count = filter_regions(&regions, min_area, "WEED").len();
            assert!(count <= previous);
            previous = count;
        }
        assert_eq!(previous, 0);
    }
}
