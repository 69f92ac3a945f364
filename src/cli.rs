use clap::Args;
use dotenv::dotenv;

use crate::config::{Bounds, KernelShape, MaskStrategy, PipelineConfig};

/// Loads `.env` (if any) and starts `env_logger` at `info` unless `RUST_LOG`
/// says otherwise. Call before parsing arguments so `.env` can set `GOB_*`.
pub fn init() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Detection thresholds shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Mask strategy: adaptive threshold on ExG alone, or ExG and HSV range masks
    #[arg(long, value_enum, default_value_t = MaskStrategy::IndexOnly, env = "GOB_STRATEGY")]
    pub strategy: MaskStrategy,
    #[arg(long, default_value_t = 30, env = "GOB_EXG_MIN")]
    pub exg_min: u8,
    #[arg(long, default_value_t = 250, env = "GOB_EXG_MAX")]
    pub exg_max: u8,
    #[arg(long, default_value_t = 30, env = "GOB_HUE_MIN")]
    pub hue_min: u8,
    #[arg(long, default_value_t = 90, env = "GOB_HUE_MAX")]
    pub hue_max: u8,
    #[arg(long, default_value_t = 30, env = "GOB_SATURATION_MIN")]
    pub saturation_min: u8,
    #[arg(long, default_value_t = 255, env = "GOB_SATURATION_MAX")]
    pub saturation_max: u8,
    #[arg(long, default_value_t = 5, env = "GOB_BRIGHTNESS_MIN")]
    pub brightness_min: u8,
    #[arg(long, default_value_t = 200, env = "GOB_BRIGHTNESS_MAX")]
    pub brightness_max: u8,
    /// Keep hues outside [hue-min, hue-max] instead of inside
    #[arg(long, env = "GOB_INVERT_HUE")]
    pub invert_hue: bool,
    /// Regions need an area strictly above this to be reported
    #[arg(long, default_value_t = 100.0, env = "GOB_MIN_AREA")]
    pub min_area: f64,
    /// Odd neighbourhood size for the adaptive threshold
    #[arg(long, default_value_t = 31, env = "GOB_BLOCK_SIZE")]
    pub block_size: i32,
    /// Constant subtracted from the local Gaussian mean
    #[arg(long, default_value_t = 2.0, env = "GOB_THRESHOLD_C", allow_hyphen_values = true)]
    pub threshold_c: f64,
    #[arg(long, value_enum, default_value_t = KernelShape::Ellipse, env = "GOB_KERNEL_SHAPE")]
    pub kernel_shape: KernelShape,
    #[arg(long, default_value_t = 3, env = "GOB_KERNEL_SIZE")]
    pub kernel_size: i32,
    #[arg(long, default_value_t = 1, env = "GOB_CLOSE_ITERATIONS")]
    pub close_iterations: i32,
    #[arg(long, default_value = "WEED", env = "GOB_LABEL")]
    pub label: String,
}

impl PipelineArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            strategy: self.strategy,
            index: Bounds::new(self.exg_min, self.exg_max),
            hue: Bounds::new(self.hue_min, self.hue_max),
            saturation: Bounds::new(self.saturation_min, self.saturation_max),
            brightness: Bounds::new(self.brightness_min, self.brightness_max),
            invert_hue: self.invert_hue,
            min_detection_area: self.min_area,
            block_size: self.block_size,
            c: self.threshold_c,
            kernel_shape: self.kernel_shape,
            kernel_size: self.kernel_size,
            close_iterations: self.close_iterations,
            label: self.label.clone(),
        }
    }
}
