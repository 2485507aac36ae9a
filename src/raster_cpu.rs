use crate::error::{StreaklabError, StreaklabResult};

pub type PremulRgba8 = [u8; 4];

/// Premultiplied source pixel from a straight-alpha color.
pub fn premul_src(rgb: [u8; 3], alpha: f64) -> PremulRgba8 {
    let a = ((alpha.clamp(0.0, 1.0) * 255.0).round() as i64).clamp(0, 255) as u16;
    let premul = |c: u8| -> u8 { mul_div255(u16::from(c), a) };
    [premul(rgb[0]), premul(rgb[1]), premul(rgb[2]), a as u8]
}

pub fn premul_white(alpha: f64) -> PremulRgba8 {
    premul_src([255, 255, 255], alpha)
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f64) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i64).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Alpha ramp along a unit interval: gradient stops with strictly increasing
/// positions in [0, 1]. Evaluation interpolates linearly between stops.
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaRamp {
    stops: Vec<(f64, f64)>,
}

impl AlphaRamp {
    pub fn new(stops: Vec<(f64, f64)>) -> StreaklabResult<Self> {
        if stops.len() < 2 {
            return Err(StreaklabError::render("alpha ramp needs at least 2 stops"));
        }
        for &(pos, alpha) in &stops {
            if !(0.0..=1.0).contains(&pos) || !pos.is_finite() {
                return Err(StreaklabError::render(format!(
                    "alpha ramp stop position {pos} is outside [0, 1]"
                )));
            }
            if !(0.0..=1.0).contains(&alpha) || !alpha.is_finite() {
                return Err(StreaklabError::render(format!(
                    "alpha ramp stop alpha {alpha} is outside [0, 1]"
                )));
            }
        }
        if stops.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(StreaklabError::render(
                "alpha ramp stop positions must be strictly increasing",
            ));
        }
        Ok(Self { stops })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for w in self.stops.windows(2) {
            let (p0, a0) = w[0];
            let (p1, a1) = w[1];
            if t <= p1 {
                let f = (t - p0) / (p1 - p0);
                return a0 + (a1 - a0) * f;
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Vertical line stroke centered on `x`, running from `y` to `y + len`, with
/// per-row alpha taken from the ramp (t = 0 at the top, t = 1 at the bottom).
/// Fractional edge rows and columns get coverage-weighted alpha.
pub fn vline_gradient(
    buf: &mut [u8],
    width: u32,
    height: u32,
    x: f64,
    y: f64,
    len: f64,
    stroke_width: f64,
    ramp: &AlphaRamp,
    global_alpha: f64,
) -> StreaklabResult<()> {
    check_len(buf, width, height)?;
    if !(len > 0.0) || !(stroke_width > 0.0) {
        return Err(StreaklabError::render(
            "gradient stroke needs positive length and width",
        ));
    }

    let x0 = x - stroke_width * 0.5;
    let x1 = x + stroke_width * 0.5;
    let y1 = y + len;

    for yi in span(y, y1) {
        let cov_y = overlap(yi as f64, yi as f64 + 1.0, y, y1);
        if cov_y <= 0.0 {
            continue;
        }
        let t = ((yi as f64 + 0.5) - y) / len;
        let row_alpha = ramp.eval(t) * global_alpha;
        for xi in span(x0, x1) {
            let cov_x = overlap(xi as f64, xi as f64 + 1.0, x0, x1);
            if cov_x <= 0.0 {
                continue;
            }
            over_px(
                buf,
                width,
                height,
                xi,
                yi,
                premul_white(row_alpha * cov_x * cov_y),
            );
        }
    }
    Ok(())
}

/// Radial falloff fill over the whole buffer: `center_alpha` at the center,
/// fading linearly to transparent at `radius`.
pub fn radial_fill(
    buf: &mut [u8],
    width: u32,
    height: u32,
    cx: f64,
    cy: f64,
    radius: f64,
    rgb: [u8; 3],
    center_alpha: f64,
    global_alpha: f64,
) -> StreaklabResult<()> {
    check_len(buf, width, height)?;
    if !(radius > 0.0) {
        return Err(StreaklabError::render("radial fill needs a positive radius"));
    }

    for yi in 0..height as i64 {
        for xi in 0..width as i64 {
            let dx = (xi as f64 + 0.5) - cx;
            let dy = (yi as f64 + 0.5) - cy;
            let d = (dx * dx + dy * dy).sqrt() / radius;
            if d >= 1.0 {
                continue;
            }
            let alpha = center_alpha * (1.0 - d) * global_alpha;
            over_px(buf, width, height, xi, yi, premul_src(rgb, alpha));
        }
    }
    Ok(())
}

/// Blend a frozen copy of the buffer over itself, offset by `(dx, dy)`, at
/// `opacity`. The copy is taken before any write, so the blend never feeds
/// back into its own source.
pub fn blit_self_offset(
    buf: &mut [u8],
    width: u32,
    height: u32,
    dx: i64,
    dy: i64,
    opacity: f64,
) -> StreaklabResult<()> {
    check_len(buf, width, height)?;
    if opacity <= 0.0 {
        return Ok(());
    }

    let frozen = buf.to_vec();
    let w = width as i64;
    let h = height as i64;
    for yi in 0..h {
        let sy = yi - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for xi in 0..w {
            let sx = xi - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let si = ((sy * w + sx) as usize) * 4;
            let src = [frozen[si], frozen[si + 1], frozen[si + 2], frozen[si + 3]];
            let di = ((yi * w + xi) as usize) * 4;
            let dst = [buf[di], buf[di + 1], buf[di + 2], buf[di + 3]];
            let out = over(dst, src, opacity);
            buf[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Blends `src` over `dst` in place, pixel by pixel. Both buffers are
/// premultiplied RGBA8 views of the same raster shape.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], 1.0);
        d.copy_from_slice(&out);
    }
}

/// One-pixel-wide line segment stroked with a radial falloff paint: full
/// color at `(cx, cy)`, transparent at `falloff_radius` from it.
pub fn line_radial(
    buf: &mut [u8],
    width: u32,
    height: u32,
    p0: (f64, f64),
    p1: (f64, f64),
    center: (f64, f64),
    falloff_radius: f64,
    rgb: [u8; 3],
    global_alpha: f64,
) -> StreaklabResult<()> {
    check_len(buf, width, height)?;
    if !(falloff_radius > 0.0) {
        return Err(StreaklabError::render(
            "radial line paint needs a positive falloff radius",
        ));
    }

    let steps = (p1.0 - p0.0).abs().max((p1.1 - p0.1).abs()).ceil() as i64;
    for i in 0..=steps {
        let t = if steps == 0 {
            0.0
        } else {
            i as f64 / steps as f64
        };
        let px = p0.0 + (p1.0 - p0.0) * t;
        let py = p0.1 + (p1.1 - p0.1) * t;
        let d = ((px - center.0).powi(2) + (py - center.1).powi(2)).sqrt() / falloff_radius;
        let alpha = (1.0 - d).max(0.0) * global_alpha;
        over_px(
            buf,
            width,
            height,
            px.round() as i64,
            py.round() as i64,
            premul_src(rgb, alpha),
        );
    }
    Ok(())
}

fn over_px(buf: &mut [u8], width: u32, height: u32, x: i64, y: i64, src: PremulRgba8) {
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        return;
    }
    let idx = ((y * i64::from(width) + x) as usize) * 4;
    let dst = [buf[idx], buf[idx + 1], buf[idx + 2], buf[idx + 3]];
    let out = over(dst, src, 1.0);
    buf[idx..idx + 4].copy_from_slice(&out);
}

fn check_len(buf: &[u8], width: u32, height: u32) -> StreaklabResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StreaklabError::render("raster buffer size overflow"))?;
    if buf.len() != expected {
        return Err(StreaklabError::render(
            "raster op expects a buffer matching width*height*4",
        ));
    }
    Ok(())
}

fn span(a: f64, b: f64) -> std::ops::Range<i64> {
    (a.floor() as i64)..(b.ceil() as i64)
}

fn overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).clamp(0.0, 1.0)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
