use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::MAX_PRIMITIVES;
use crate::error::Result;
use crate::meshing::FieldParams;

/// Scalars the user can tune, read from a JSON file
///
/// Missing fields take their defaults. Nothing here is validated by the mesher; `clamped`
/// applies the ranges the controls allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub sphere_count: usize,
    pub target_radius: f32,
    /// fraction of `target_radius` each radius may deviate by
    pub radius_variance: f32,
    pub smooth_k: f32,
    pub speed: f32,
    pub iso_level: f32,
    /// half the edge length of the meshed cube
    pub volume_radius: f32,
    pub cells_per_axis: u32,
    pub tick_rate: f32,
    /// fixed seed for the sphere layout, random when absent
    pub seed: Option<u64>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        BlobConfig {
            sphere_count: 24,
            target_radius: 0.0125,
            radius_variance: 0.3,
            smooth_k: 0.055,
            speed: 0.25,
            iso_level: 0.,
            volume_radius: 0.175,
            cells_per_axis: 40,
            tick_rate: 60.,
            seed: None,
        }
    }
}

impl BlobConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The same settings limited to the ranges the UI sliders allow
    pub fn clamped(&self) -> Self {
        BlobConfig {
            sphere_count: self.sphere_count.clamp(1, MAX_PRIMITIVES),
            target_radius: self.target_radius.clamp(0.005, 0.05),
            radius_variance: self.radius_variance.clamp(0., 1.),
            smooth_k: self.smooth_k.clamp(0., 0.12),
            speed: self.speed.clamp(0., 1.),
            cells_per_axis: self.cells_per_axis.max(1),
            tick_rate: self.tick_rate.max(1.),
            ..self.clone()
        }
    }

    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            iso_level: self.iso_level,
            smooth_k: self.smooth_k,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(1. / self.tick_rate.max(1.))
    }
}
