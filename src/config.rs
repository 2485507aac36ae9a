use crate::error::{StreaklabError, StreaklabResult};

/// Fixed parameters of one pipeline run. All counts are design constants;
/// the seed controls every random draw made by the run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Square canvas dimension D. All drawing coordinates lie in [0, D).
    pub dimension: u32,
    /// Number of streaks per generation pass.
    pub streak_count: usize,
    /// Ambient background grain dots drawn under the streak field.
    pub background_dots: usize,
    /// Salt-and-pepper pixel count for the noise stack.
    pub noise_pixels: usize,
    /// Determinism seed for the run's random source.
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dimension: 400,
            streak_count: 150,
            background_dots: 1000,
            noise_pixels: 4000,
            seed: 1,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> StreaklabResult<()> {
        if self.dimension == 0 {
            return Err(StreaklabError::config("canvas dimension must be > 0"));
        }
        if self.dimension > u32::from(u16::MAX) {
            return Err(StreaklabError::config(format!(
                "canvas dimension {} exceeds the pixmap limit of {}",
                self.dimension,
                u16::MAX
            )));
        }
        Ok(())
    }
}
