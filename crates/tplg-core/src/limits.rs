//! Validation bounds, loadable from TOML

use serde::{Deserialize, Serialize};

/// An inclusive `[min, max]` bound on one decoded field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bound {
    pub min: u32,
    pub max: u32,
}

impl Bound {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Validation limits with the checker's built-in defaults. Any subset may be
/// overridden from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Buffer size in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: Bound,
    #[serde(default = "default_pipeline")]
    pub pipeline_deadline: Bound,
    #[serde(default = "default_pipeline")]
    pub pipeline_priority: Bound,
    #[serde(default = "default_pipeline")]
    pub pipeline_mips: Bound,
    #[serde(default = "default_pipeline")]
    pub pipeline_core: Bound,
    #[serde(default = "default_pipeline")]
    pub pipeline_frames: Bound,
    /// PDM clock rate in Hz.
    #[serde(default = "default_dmic_pdmclk")]
    pub dmic_pdmclk: Bound,
    /// PDM clock duty cycle in percent.
    #[serde(default = "default_dmic_duty")]
    pub dmic_duty: Bound,
    /// FIFO sample rate in Hz.
    #[serde(default = "default_dmic_fifo_rate")]
    pub dmic_fifo_rate: Bound,
    #[serde(default = "default_dmic_pdm_active")]
    pub dmic_pdm_active: Bound,
    #[serde(default = "default_dmic_fifo_bits")]
    pub dmic_fifo_bits: Bound,
    /// Maximum SSP TDM slot width in bits.
    #[serde(default = "default_ssp_slot_width_max")]
    pub ssp_slot_width_max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            pipeline_deadline: default_pipeline(),
            pipeline_priority: default_pipeline(),
            pipeline_mips: default_pipeline(),
            pipeline_core: default_pipeline(),
            pipeline_frames: default_pipeline(),
            dmic_pdmclk: default_dmic_pdmclk(),
            dmic_duty: default_dmic_duty(),
            dmic_fifo_rate: default_dmic_fifo_rate(),
            dmic_pdm_active: default_dmic_pdm_active(),
            dmic_fifo_bits: default_dmic_fifo_bits(),
            ssp_slot_width_max: default_ssp_slot_width_max(),
        }
    }
}

fn default_buffer_size() -> Bound {
    Bound::new(1, 1000)
}

fn default_pipeline() -> Bound {
    Bound::new(1, 1000)
}

fn default_dmic_pdmclk() -> Bound {
    Bound::new(100_000, 5_000_000)
}

fn default_dmic_duty() -> Bound {
    Bound::new(1, 100)
}

fn default_dmic_fifo_rate() -> Bound {
    Bound::new(8_000, 96_000)
}

fn default_dmic_pdm_active() -> Bound {
    Bound::new(1, 2)
}

fn default_dmic_fifo_bits() -> Bound {
    Bound::new(16, 32)
}

fn default_ssp_slot_width_max() -> u32 {
    38
}
