use log::debug;
use opencv::{core::Mat, Result};

use crate::annotate::annotate;
use crate::binarize::{adaptive_binarize, clip, Mask};
use crate::color_filter::color_filter;
use crate::config::{MaskStrategy, PipelineConfig};
use crate::index::{excess_green, IndexMap};
use crate::morphology::close;
use crate::regions::{detect_regions, DetectionSet};

/// Everything one frame produces, intermediate rasters included.
#[derive(Debug)]
pub struct PipelineOutput {
    pub index: IndexMap,
    pub mask: Mask,
    pub detections: DetectionSet,
    pub annotated: Mat,
}

/// Frame-to-detections chain. Holds only its configuration, so a single
/// instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Index map and raw (pre-closing) mask for the configured strategy.
    pub fn mask(&self, frame: &Mat) -> Result<(IndexMap, Mask)> {
        let index = excess_green(frame)?;
        let mask = match self.config.strategy {
            MaskStrategy::IndexOnly => {
                let clipped = clip(&index, self.config.index)?;
                adaptive_binarize(&clipped, &self.config)?
            }
            MaskStrategy::IndexAndColor => color_filter(frame, &index, &self.config)?,
        };
        Ok((index, mask))
    }

    pub fn run(&self, frame: &Mat) -> Result<PipelineOutput> {
        let (index, raw) = self.mask(frame)?;
        let mask = close(&raw, &self.config)?;
        let detections = detect_regions(&mask, &self.config)?;
        debug!(
            "{:?}: {} foreground cells, {} detections",
            self.config.strategy,
            mask.foreground_count()?,
            detections.len()
        );
        let annotated = annotate(frame, &detections)?;
        Ok(PipelineOutput {
            index,
            mask,
            detections,
            annotated,
        })
    }
}
