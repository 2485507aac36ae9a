use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::{
    config::PipelineConfig,
    error::StreaklabResult,
    field,
    noise,
    overlay,
    persist::SnapshotSink,
    streak::StreakLedger,
    surface::Surface,
};

const CROSSHAIR_HALF_LEN: f64 = 4.0;
const CROSSHAIR_FALLOFF_RADIUS: f64 = 20.0;

/// The four pipeline stages, in execution order. Each stage ends with a
/// persisted snapshot named after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Clean base field.
    Base,
    /// Base field with the full noise stack applied.
    Noisy,
    /// Regenerated clean field.
    Clean,
    /// Regenerated field with vector overlay and crosshair.
    Final,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Base, Stage::Noisy, Stage::Clean, Stage::Final];

    pub fn artifact_name(self) -> &'static str {
        match self {
            Stage::Base => "stage1",
            Stage::Noisy => "stage2",
            Stage::Clean => "stage3",
            Stage::Final => "stage4",
        }
    }
}

/// Runs the whole pipeline: generate, degrade, regenerate, overlay. The
/// surface is mutated destructively in place, so every snapshot is persisted
/// before the next stage draws. A sink failure aborts immediately; the
/// remaining stages depend on raster state the caller can no longer trust
/// to be persisted.
///
/// "Denoising" here is simulated: the clean stage discards the noisy raster
/// and redraws the field from scratch. Nothing filters corrupted pixels.
///
/// Returns the ledger of the regenerated pass, the one the overlay glyphs
/// were derived from.
#[tracing::instrument(skip(cfg, sink), fields(seed = cfg.seed, dimension = cfg.dimension))]
pub fn run_pipeline(
    cfg: &PipelineConfig,
    sink: &mut dyn SnapshotSink,
) -> StreaklabResult<StreakLedger> {
    cfg.validate()?;

    let mut surface = Surface::new(cfg.dimension)?;
    let mut rng = Pcg32::seed_from_u64(cfg.seed);
    let mut ledger = StreakLedger::new();

    field::generate(&mut surface, &mut rng, cfg, &mut ledger)?;
    persist_stage(&mut surface, sink, Stage::Base)?;

    noise::apply_noise(&mut surface, &mut rng, cfg)?;
    persist_stage(&mut surface, sink, Stage::Noisy)?;

    ledger.clear();
    field::generate(&mut surface, &mut rng, cfg, &mut ledger)?;
    persist_stage(&mut surface, sink, Stage::Clean)?;

    overlay::draw_vectors(&mut surface, &ledger)?;
    stamp_crosshair(&mut surface, &mut rng, cfg)?;
    persist_stage(&mut surface, sink, Stage::Final)?;

    Ok(ledger)
}

fn persist_stage(
    surface: &mut Surface,
    sink: &mut dyn SnapshotSink,
    stage: Stage,
) -> StreaklabResult<()> {
    let frame = surface.snapshot();
    sink.save(&frame, stage.artifact_name())?;
    tracing::debug!(?stage, name = stage.artifact_name(), "persisted snapshot");
    Ok(())
}

/// Decorative "+" marker at a uniform random point, stroked with a white
/// radial falloff paint. Independent of any streak data.
fn stamp_crosshair<R: Rng>(
    surface: &mut Surface,
    rng: &mut R,
    cfg: &PipelineConfig,
) -> StreaklabResult<()> {
    let d = f64::from(cfg.dimension);
    let cx = rng.random_range(0.0..d);
    let cy = rng.random_range(0.0..d);

    surface.stroke_line_radial(
        (cx - CROSSHAIR_HALF_LEN, cy),
        (cx + CROSSHAIR_HALF_LEN, cy),
        (cx, cy),
        CROSSHAIR_FALLOFF_RADIUS,
        [255, 255, 255],
    )?;
    surface.stroke_line_radial(
        (cx, cy - CROSSHAIR_HALF_LEN),
        (cx, cy + CROSSHAIR_HALF_LEN),
        (cx, cy),
        CROSSHAIR_FALLOFF_RADIUS,
        [255, 255, 255],
    )?;
    Ok(())
}
