use rand::Rng;

use crate::{
    config::PipelineConfig,
    error::{StreaklabError, StreaklabResult},
    raster_cpu::AlphaRamp,
    streak::{StreakLedger, StreakRecord},
    surface::Surface,
};

pub const STREAK_LENGTH_MIN: f64 = 10.0;
pub const STREAK_LENGTH_MAX: f64 = 50.0;
pub const STREAK_ALPHA_MIN: f64 = 0.1;
pub const STREAK_ALPHA_MAX: f64 = 0.8;
pub const STREAK_WIDTH_MIN: f64 = 1.0;
pub const STREAK_WIDTH_MAX: f64 = 2.0;

/// Vertical fraction of the canvas in which streak heads may start; streaks
/// never start in the bottom 10% of the field.
pub const STREAK_Y_FRACTION: f64 = 0.9;

const BACKGROUND_DOT_ALPHA: f64 = 0.02;

/// Renders a streak field onto the surface and fills the ledger with one
/// record per streak.
///
/// The ledger must be empty: a generation pass always describes exactly the
/// streaks it drew, never an accumulation across passes. Callers that want a
/// fresh pass clear the ledger first.
///
/// Draw order is layered: opaque black base, then ambient background grain,
/// then the streaks; later draws land on top of earlier ones.
pub fn generate<R: Rng>(
    surface: &mut Surface,
    rng: &mut R,
    cfg: &PipelineConfig,
    ledger: &mut StreakLedger,
) -> StreaklabResult<()> {
    if !ledger.is_empty() {
        return Err(StreaklabError::pipeline(format!(
            "ledger must be empty before a generation pass (holds {} records)",
            ledger.len()
        )));
    }

    let d = f64::from(cfg.dimension);
    surface.fill_canvas([0, 0, 0], 1.0);

    for _ in 0..cfg.background_dots {
        let x = rng.random_range(0.0..d);
        let y = rng.random_range(0.0..d);
        surface.fill_px(x, y, [255, 255, 255], BACKGROUND_DOT_ALPHA);
    }

    for _ in 0..cfg.streak_count {
        let record = sample_streak(rng, cfg.dimension);
        let ramp = AlphaRamp::new(vec![
            (0.0, record.alpha),
            (0.8, record.alpha * 0.5),
            (1.0, 0.0),
        ])?;
        let (hx, hy) = record.head();
        surface.stroke_vline_gradient(hx, hy, record.length, record.line_width, &ramp)?;
        ledger.push(record);
    }

    Ok(())
}

/// Draws one streak's parameters. The draw order (x, y, length, alpha,
/// line width) is fixed so a seeded random source reproduces identical
/// ledgers.
fn sample_streak<R: Rng>(rng: &mut R, dimension: u32) -> StreakRecord {
    let y_max = (f64::from(dimension) * STREAK_Y_FRACTION).floor() as u32;
    StreakRecord {
        x: rng.random_range(0..=dimension),
        y: rng.random_range(0..=y_max),
        length: rng.random_range(STREAK_LENGTH_MIN..STREAK_LENGTH_MAX),
        alpha: rng.random_range(STREAK_ALPHA_MIN..STREAK_ALPHA_MAX),
        line_width: rng.random_range(STREAK_WIDTH_MIN..STREAK_WIDTH_MAX),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn generation_fills_the_ledger_with_exactly_n_records() {
        let cfg = PipelineConfig {
            dimension: 64,
            streak_count: 40,
            background_dots: 50,
            ..PipelineConfig::default()
        };
        let mut surface = Surface::new(cfg.dimension).unwrap();
        let mut rng = Pcg32::seed_from_u64(cfg.seed);
        let mut ledger = StreakLedger::new();

        generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap();

        assert_eq!(ledger.len(), cfg.streak_count);
        let y_max = (f64::from(cfg.dimension) * STREAK_Y_FRACTION).floor() as u32;
        for r in &ledger {
            assert!(r.x <= cfg.dimension);
            assert!(r.y <= y_max);
            assert!((STREAK_LENGTH_MIN..STREAK_LENGTH_MAX).contains(&r.length));
            assert!((STREAK_ALPHA_MIN..STREAK_ALPHA_MAX).contains(&r.alpha));
            assert!((STREAK_WIDTH_MIN..STREAK_WIDTH_MAX).contains(&r.line_width));
        }
    }

    #[test]
    fn generation_rejects_a_non_empty_ledger() {
        let cfg = PipelineConfig {
            dimension: 32,
            streak_count: 5,
            background_dots: 0,
            ..PipelineConfig::default()
        };
        let mut surface = Surface::new(cfg.dimension).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ledger = StreakLedger::new();

        generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap();
        let err = generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap_err();
        assert!(err.to_string().contains("ledger must be empty"));

        // clearing first makes the second pass legal and resets, not appends
        ledger.clear();
        generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap();
        assert_eq!(ledger.len(), cfg.streak_count);
    }

    #[test]
    fn equal_seeds_generate_equal_ledgers() {
        let cfg = PipelineConfig {
            dimension: 64,
            streak_count: 20,
            background_dots: 30,
            ..PipelineConfig::default()
        };
        let mut ledgers = Vec::new();
        for _ in 0..2 {
            let mut surface = Surface::new(cfg.dimension).unwrap();
            let mut rng = Pcg32::seed_from_u64(99);
            let mut ledger = StreakLedger::new();
            generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap();
            ledgers.push(ledger);
        }
        assert_eq!(ledgers[0], ledgers[1]);
    }

    #[test]
    fn generated_field_is_mostly_black_with_bright_spots() {
        let cfg = PipelineConfig {
            dimension: 64,
            streak_count: 10,
            background_dots: 0,
            ..PipelineConfig::default()
        };
        let mut surface = Surface::new(cfg.dimension).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut ledger = StreakLedger::new();
        generate(&mut surface, &mut rng, &cfg, &mut ledger).unwrap();

        let frame = surface.snapshot();
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
        assert!(frame.data.chunks_exact(4).any(|px| px[0] > 0));
    }
}
