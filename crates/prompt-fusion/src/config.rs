//! Configuration types for prompt compilation.
//!
//! All types implement [`serde::Deserialize`] with defaults for every field,
//! so a partial configuration file is always valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`TensorConfig`] - Limits of the interpolation tensor.
//! - [`ScheduleConfig`] - Default step budget and host flags.
//!
//! # Example
//!
//! ```
//! # use prompt_fusion::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.schedule().steps(), 20);
//! assert_eq!(config.tensor().max_interpolation_leaves(), 1000);
//! ```

use serde::Deserialize;

use crate::tensor::{DEFAULT_MAX_INTERPOLATION_LEAVES, StepContext};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Interpolation tensor section.
    #[serde(default)]
    tensor: TensorConfig,

    /// Schedule section.
    #[serde(default)]
    schedule: ScheduleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(tensor: TensorConfig, schedule: ScheduleConfig) -> Self {
        Self { tensor, schedule }
    }

    /// Returns the tensor configuration.
    pub fn tensor(&self) -> &TensorConfig {
        &self.tensor
    }

    /// Returns the schedule configuration.
    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Returns the schedule configuration for modification.
    pub fn schedule_mut(&mut self) -> &mut ScheduleConfig {
        &mut self.schedule
    }

    /// Builds the evaluation context these settings describe.
    pub fn step_context(&self) -> StepContext {
        StepContext::new(self.schedule.steps)
            .with_hires(self.schedule.hires)
            .with_old_scheduling(self.schedule.use_old_scheduling)
            .with_max_interpolation_leaves(self.tensor.max_interpolation_leaves)
    }
}

/// Limits of the interpolation tensor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TensorConfig {
    /// Most leaves an interpolated attention weight expands into.
    max_interpolation_leaves: usize,
}

impl TensorConfig {
    pub fn new(max_interpolation_leaves: usize) -> Self {
        Self {
            max_interpolation_leaves,
        }
    }

    pub fn max_interpolation_leaves(&self) -> usize {
        self.max_interpolation_leaves
    }
}

impl Default for TensorConfig {
    fn default() -> Self {
        Self {
            max_interpolation_leaves: DEFAULT_MAX_INTERPOLATION_LEAVES,
        }
    }
}

/// Default step budget and host flags.
///
/// The command line overrides each of these.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    steps: usize,
    hires: bool,
    use_old_scheduling: bool,
}

impl ScheduleConfig {
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn hires(&self) -> bool {
        self.hires
    }

    pub fn use_old_scheduling(&self) -> bool {
        self.use_old_scheduling
    }

    pub fn set_steps(&mut self, steps: usize) {
        self.steps = steps;
    }

    pub fn set_hires(&mut self, hires: bool) {
        self.hires = hires;
    }

    pub fn set_use_old_scheduling(&mut self, use_old_scheduling: bool) {
        self.use_old_scheduling = use_old_scheduling;
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            hires: false,
            use_old_scheduling: false,
        }
    }
}
