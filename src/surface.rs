use vello_cpu::{
    Pixmap, RenderContext,
    kurbo::{Affine, BezPath, Rect},
    peniko::Color,
};

use crate::{
    error::{StreaklabError, StreaklabResult},
    persist::FrameRgba,
    raster_cpu::{self, AlphaRamp},
};

/// Canvas-style paint state. `save`/`restore` stack these values; pixels are
/// never part of the state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintState {
    pub global_alpha: f64,
    pub stroke_width: f64,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            global_alpha: 1.0,
            stroke_width: 1.0,
        }
    }
}

/// Square premultiplied-RGBA8 raster with the drawing primitives the
/// pipeline needs. Solid fills and filled paths are batched through a
/// `vello_cpu` render context; gradient strokes, radial paints, and the
/// self-blit operate directly on the pixel buffer. Every primitive honors
/// the current global alpha.
pub struct Surface {
    width: u16,
    height: u16,
    pixmap: Pixmap,
    ctx: RenderContext,
    pending: bool,
    state: PaintState,
    saved: Vec<PaintState>,
}

impl Surface {
    pub fn new(dimension: u32) -> StreaklabResult<Self> {
        let side: u16 = dimension
            .try_into()
            .map_err(|_| StreaklabError::render("surface dimension exceeds u16"))?;
        if side == 0 {
            return Err(StreaklabError::render("surface dimension must be > 0"));
        }
        Ok(Self {
            width: side,
            height: side,
            pixmap: Pixmap::new(side, side),
            ctx: new_ctx(side, side),
            pending: false,
            state: PaintState::default(),
            saved: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn stroke_width(&self) -> f64 {
        self.state.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.state.stroke_width = width.max(0.0);
    }

    pub fn save(&mut self) {
        self.saved.push(self.state);
    }

    /// Pops the most recent `save`. A restore with no matching save keeps
    /// the current state, as a 2D canvas does.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    pub fn fill_canvas(&mut self, rgb: [u8; 3], alpha: f64) {
        self.fill_rect(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
            rgb,
            alpha,
        );
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: [u8; 3], alpha: f64) {
        let Some(color) = self.effective_color(rgb, alpha) else {
            return;
        };
        self.ctx.set_paint(color);
        self.ctx.fill_rect(&Rect::new(x, y, x + w, y + h));
        self.pending = true;
    }

    pub fn fill_px(&mut self, x: f64, y: f64, rgb: [u8; 3], alpha: f64) {
        self.fill_rect(x, y, 1.0, 1.0, rgb, alpha);
    }

    pub fn fill_triangle(&mut self, pts: [(f64, f64); 3], rgb: [u8; 3], alpha: f64) {
        let Some(color) = self.effective_color(rgb, alpha) else {
            return;
        };
        let mut path = BezPath::new();
        path.move_to(pts[0]);
        path.line_to(pts[1]);
        path.line_to(pts[2]);
        path.close_path();
        self.ctx.set_paint(color);
        self.ctx.fill_path(&path);
        self.pending = true;
    }

    /// Strokes a vertical line from `(x, y)` to `(x, y + len)` with the
    /// given alpha ramp (t = 0 at the top end).
    pub fn stroke_vline_gradient(
        &mut self,
        x: f64,
        y: f64,
        len: f64,
        stroke_width: f64,
        ramp: &AlphaRamp,
    ) -> StreaklabResult<()> {
        self.flush();
        let (w, h, ga) = (self.width(), self.height(), self.state.global_alpha);
        raster_cpu::vline_gradient(
            self.pixmap.data_as_u8_slice_mut(),
            w,
            h,
            x,
            y,
            len,
            stroke_width,
            ramp,
            ga,
        )
    }

    /// Radial falloff fill over the whole surface.
    pub fn fill_radial(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        rgb: [u8; 3],
        center_alpha: f64,
    ) -> StreaklabResult<()> {
        self.flush();
        let (w, h, ga) = (self.width(), self.height(), self.state.global_alpha);
        raster_cpu::radial_fill(
            self.pixmap.data_as_u8_slice_mut(),
            w,
            h,
            cx,
            cy,
            radius,
            rgb,
            center_alpha,
            ga,
        )
    }

    /// Blends a frozen copy of the surface over itself at the given offset.
    /// The blend opacity is the current global alpha.
    pub fn blit_self(&mut self, dx: i64, dy: i64) -> StreaklabResult<()> {
        self.flush();
        let (w, h, ga) = (self.width(), self.height(), self.state.global_alpha);
        raster_cpu::blit_self_offset(self.pixmap.data_as_u8_slice_mut(), w, h, dx, dy, ga)
    }

    /// One-pixel line stroked with a radial falloff paint.
    pub fn stroke_line_radial(
        &mut self,
        p0: (f64, f64),
        p1: (f64, f64),
        paint_center: (f64, f64),
        falloff_radius: f64,
        rgb: [u8; 3],
    ) -> StreaklabResult<()> {
        self.flush();
        let (w, h, ga) = (self.width(), self.height(), self.state.global_alpha);
        raster_cpu::line_radial(
            self.pixmap.data_as_u8_slice_mut(),
            w,
            h,
            p0,
            p1,
            paint_center,
            falloff_radius,
            rgb,
            ga,
        )
    }

    /// Captures the pixel state at call time.
    pub fn snapshot(&mut self) -> FrameRgba {
        self.flush();
        FrameRgba {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn effective_color(&self, rgb: [u8; 3], alpha: f64) -> Option<Color> {
        let eff = (alpha * self.state.global_alpha).clamp(0.0, 1.0);
        let byte = ((eff * 255.0).round() as i64).clamp(0, 255) as u8;
        if byte == 0 {
            return None;
        }
        Some(Color::from_rgba8(rgb[0], rgb[1], rgb[2], byte))
    }

    // render_to_pixmap overwrites its target, so the pending scene lands in
    // a scratch layer and is blended over the accumulated raster.
    fn flush(&mut self) {
        if !self.pending {
            return;
        }
        self.ctx.flush();
        let mut scratch = Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut scratch);
        raster_cpu::over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
        );
        self.ctx = new_ctx(self.width, self.height);
        self.pending = false;
    }
}

fn new_ctx(width: u16, height: u16) -> RenderContext {
    let mut ctx = RenderContext::new(width, height);
    ctx.set_paint_transform(Affine::IDENTITY);
    ctx.set_transform(Affine::IDENTITY);
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_at(frame: &FrameRgba, x: u32, y: u32) -> u8 {
        frame.data[((y * frame.width + x) * 4 + 3) as usize]
    }

    #[test]
    fn new_surface_is_transparent() {
        let mut s = Surface::new(8).unwrap();
        let frame = s.snapshot();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 8);
        assert!(frame.premultiplied);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_or_oversized_dimension_is_rejected() {
        assert!(Surface::new(0).is_err());
        assert!(Surface::new(u32::from(u16::MAX) + 1).is_err());
    }

    #[test]
    fn fill_canvas_black_makes_every_pixel_opaque() {
        let mut s = Surface::new(8).unwrap();
        s.fill_canvas([0, 0, 0], 1.0);
        let frame = s.snapshot();
        for px in frame.data.chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn fill_rect_honors_global_alpha() {
        let mut s = Surface::new(8).unwrap();
        s.set_global_alpha(0.0);
        s.fill_rect(0.0, 0.0, 8.0, 8.0, [255, 255, 255], 1.0);
        let frame = s.snapshot();
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn save_restore_round_trips_paint_state() {
        let mut s = Surface::new(4).unwrap();
        s.set_global_alpha(0.5);
        s.set_stroke_width(1.5);
        s.save();
        s.set_global_alpha(0.01);
        s.set_stroke_width(3.0);
        s.restore();
        assert_eq!(s.global_alpha(), 0.5);
        assert_eq!(s.stroke_width(), 1.5);
        // restore with no matching save keeps the current state
        s.restore();
        assert_eq!(s.global_alpha(), 0.5);
    }

    #[test]
    fn snapshot_captures_state_at_call_time() {
        let mut s = Surface::new(4).unwrap();
        s.fill_canvas([0, 0, 0], 1.0);
        let before = s.snapshot();
        s.fill_rect(0.0, 0.0, 4.0, 4.0, [255, 255, 255], 1.0);
        let after = s.snapshot();
        assert!(before.data.iter().all(|&b| b == 0 || b == 255));
        assert_ne!(before.data, after.data);
        assert_eq!(alpha_at(&before, 0, 0), 255);
    }

    #[test]
    fn batched_fills_blend_over_earlier_raster_content() {
        let mut s = Surface::new(8).unwrap();
        s.fill_canvas([0, 0, 0], 1.0);
        let ramp = AlphaRamp::new(vec![(0.0, 1.0), (1.0, 0.0)]).unwrap();
        s.stroke_vline_gradient(4.0, 0.0, 8.0, 2.0, &ramp).unwrap();
        let before = s.snapshot();
        let red_before = before.data[((8 + 4) * 4) as usize];
        assert_eq!(alpha_at(&before, 4, 1), 255);
        assert!(red_before > 200);

        // a faint batched fill lands on top of, not instead of, the raster
        s.fill_canvas([100, 100, 100], 0.005);
        let after = s.snapshot();
        assert_eq!(alpha_at(&after, 4, 1), 255);
        let red_after = after.data[((8 + 4) * 4) as usize];
        assert!(
            red_after >= red_before.saturating_sub(2),
            "streak {red_before} faded to {red_after} under a later fill"
        );
        assert!(after.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn fill_triangle_covers_interior_not_exterior() {
        let mut s = Surface::new(16).unwrap();
        s.fill_triangle([(2.0, 2.0), (14.0, 2.0), (8.0, 14.0)], [255, 0, 0], 1.0);
        let frame = s.snapshot();
        assert!(alpha_at(&frame, 8, 5) > 200);
        assert_eq!(alpha_at(&frame, 0, 15), 0);
        assert_eq!(alpha_at(&frame, 15, 15), 0);
    }
}
