//! Vegetation segmentation for green-on-brown weed detection.
//!
//! A frame flows through [`index::excess_green`], a mask strategy
//! ([`binarize`] or [`color_filter`]), [`morphology::close`],
//! [`regions::detect_regions`] and [`annotate::annotate`]. [`Pipeline`] chains
//! them; [`timing::RunAccumulator`] carries the only state that outlives a frame.

pub mod annotate;
pub mod binarize;
pub mod cli;
pub mod color_filter;
pub mod config;
pub mod frame_queue;
pub mod index;
pub mod morphology;
pub mod pipeline;
pub mod regions;
pub mod timing;
pub mod utils;

pub use binarize::Mask;
pub use config::{Bounds, KernelShape, MaskStrategy, PipelineConfig};
pub use index::IndexMap;
pub use pipeline::{Pipeline, PipelineOutput};
pub use regions::{Detection, DetectionSet, Region};
pub use timing::RunAccumulator;
