use rand::Rng;

use crate::{config::PipelineConfig, error::StreaklabResult, surface::Surface};

const HAZE_GRAY: [u8; 3] = [100, 100, 100];
const HAZE_ALPHA: f64 = 0.005;
const STRIPE_SPACING: u32 = 10;
const STRIPE_ALPHA: f64 = 0.01;
const STRIPE_WIDTH: f64 = 0.5;
const SPECKLE_COUNT: usize = 500;
const SPECKLE_ALPHA: f64 = 0.008;
const GRAIN_COUNT: usize = 2000;
const GRAIN_ALPHA: f64 = 0.05;
const SALT_PEPPER_ALPHA: f64 = 0.9;
const BLOCK_SIDE: u32 = 16;
const BLOCK_ALPHA: f64 = 0.003;
const BLOCK_PROBABILITY: f64 = 0.2;
const GHOST_OFFSET_X: i64 = 2;
const GHOST_ALPHA: f64 = 0.01;
const GLARE_CENTER_ALPHA: f64 = 0.05;

/// Composites the full noise stack onto the surface, in a fixed layer order:
/// haze, stripes, speckle, grain, salt-and-pepper, block artifacts, motion
/// ghost, radial glare. Later layers blend over earlier ones, so the order
/// is part of the visual contract. Paint state is saved on entry and
/// restored on exit; only pixels leak out of this call.
pub fn apply_noise<R: Rng>(
    surface: &mut Surface,
    rng: &mut R,
    cfg: &PipelineConfig,
) -> StreaklabResult<()> {
    surface.save();
    let result = apply_layers(surface, rng, cfg);
    surface.restore();
    result
}

fn apply_layers<R: Rng>(
    surface: &mut Surface,
    rng: &mut R,
    cfg: &PipelineConfig,
) -> StreaklabResult<()> {
    let d = f64::from(cfg.dimension);

    // 1. uniform haze
    surface.fill_canvas(HAZE_GRAY, HAZE_ALPHA);

    // 2. periodic stripes, one thin vertical line every STRIPE_SPACING px
    for x in (0..cfg.dimension).step_by(STRIPE_SPACING as usize) {
        surface.fill_rect(
            f64::from(x) - STRIPE_WIDTH * 0.5,
            0.0,
            STRIPE_WIDTH,
            d,
            [255, 255, 255],
            STRIPE_ALPHA,
        );
    }

    // 3. speckle squares
    for _ in 0..SPECKLE_COUNT {
        let x = rng.random_range(0.0..d);
        let y = rng.random_range(0.0..d);
        let side = rng.random_range(5.0..15.0);
        surface.fill_rect(x, y, side, side, [255, 255, 255], SPECKLE_ALPHA);
    }

    // 4. grain: many low-opacity single-pixel samples. This approximates
    // additive Gaussian noise statistically; it is not a per-pixel normal
    // distribution.
    for _ in 0..GRAIN_COUNT {
        let x = rng.random_range(0.0..d);
        let y = rng.random_range(0.0..d);
        surface.fill_px(x, y, [255, 255, 255], GRAIN_ALPHA);
    }

    // 5. salt-and-pepper at integer-rounded positions
    for _ in 0..cfg.noise_pixels {
        let x = rng.random_range(0.0..d).round();
        let y = rng.random_range(0.0..d).round();
        let rgb = if rng.random_bool(0.5) {
            [255, 255, 255]
        } else {
            [0, 0, 0]
        };
        surface.fill_px(x, y, rgb, SALT_PEPPER_ALPHA);
    }

    // 6. block artifacts: every block of the 16x16 partition is a candidate,
    // gated independently
    for (bx, by) in block_grid(cfg.dimension) {
        if rng.random_bool(BLOCK_PROBABILITY) {
            surface.fill_rect(
                f64::from(bx),
                f64::from(by),
                f64::from(BLOCK_SIDE),
                f64::from(BLOCK_SIDE),
                [255, 255, 255],
                BLOCK_ALPHA,
            );
        }
    }

    // 7. motion ghost: frozen copy of the raster blended back at a small
    // horizontal offset; global alpha restored right after
    surface.save();
    surface.set_global_alpha(GHOST_ALPHA);
    let ghost = surface.blit_self(GHOST_OFFSET_X, 0);
    surface.restore();
    ghost?;

    // 8. radial glare
    surface.fill_radial(0.7 * d, 0.3 * d, 0.5 * d, [255, 255, 255], GLARE_CENTER_ALPHA)?;

    Ok(())
}

/// Top-left corners of the 16x16 block partition: `ceil(D/16)^2` candidate
/// blocks in row-major order.
fn block_grid(dimension: u32) -> impl Iterator<Item = (u32, u32)> {
    let blocks = dimension.div_ceil(BLOCK_SIDE);
    (0..blocks).flat_map(move |row| (0..blocks).map(move |col| (col * BLOCK_SIDE, row * BLOCK_SIDE)))
}
