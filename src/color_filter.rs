use log::debug;
use opencv::{
    core::{self, Mat, Vector},
    imgproc::{self, COLOR_BGR2HSV},
    prelude::*,
    Result,
};

use crate::binarize::{range_mask, Mask};
use crate::config::PipelineConfig;
use crate::index::{ensure_bgr, IndexMap};

/// Intersects the index range mask with hue, saturation and brightness range
/// masks computed from the frame's HSV representation.
pub fn color_filter(frame: &Mat, index: &IndexMap, config: &PipelineConfig) -> Result<Mask> {
    ensure_bgr(frame)?;
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(frame, &mut hsv, COLOR_BGR2HSV)?;
    let mut channels = Vector::<Mat>::new();
    core::split(&hsv, &mut channels)?;

    let index_mask = range_mask(index.as_mat(), config.index)?;
    let mut hue_mask = range_mask(&channels.get(0)?, config.hue)?;
    if config.invert_hue {
        hue_mask = hue_mask.complement()?;
    }
    let saturation_mask = range_mask(&channels.get(1)?, config.saturation)?;
    let brightness_mask = range_mask(&channels.get(2)?, config.brightness)?;

    debug!(
        "colour masks: index={} hue={} saturation={} brightness={}",
        index_mask.foreground_count()?,
        hue_mask.foreground_count()?,
        saturation_mask.foreground_count()?,
        brightness_mask.foreground_count()?
    );

    index_mask
        .intersect(&hue_mask)?
        .intersect(&saturation_mask)?
        .intersect(&brightness_mask)
}
