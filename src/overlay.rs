use crate::{error::StreaklabResult, streak::StreakLedger, surface::Surface};

pub const ARROW_HALF_WIDTH: f64 = 2.5;
pub const ARROW_HEIGHT: f64 = 5.0;
const ARROW_RED: [u8; 3] = [255, 0, 0];
const ARROW_ALPHA: f64 = 0.9;
const SHAFT_STROKE_WIDTH: f64 = 1.5;

/// Triangle vertices of a record's arrowhead: base across the tail point,
/// apex further down. The arrow points toward increasing y, the direction
/// of decreasing streak intensity.
pub fn arrowhead(record: &crate::streak::StreakRecord) -> [(f64, f64); 3] {
    let (tx, ty) = record.tail();
    [
        (tx - ARROW_HALF_WIDTH, ty),
        (tx + ARROW_HALF_WIDTH, ty),
        (tx, ty + ARROW_HEIGHT),
    ]
}

/// Draws one velocity-vector glyph per ledger record. The ledger is read
/// only; glyph geometry is a pure function of each record.
///
/// Stroke width is set for shaft lines, but only the filled arrowheads are
/// drawn today.
pub fn draw_vectors(surface: &mut Surface, ledger: &StreakLedger) -> StreaklabResult<()> {
    surface.set_stroke_width(SHAFT_STROKE_WIDTH);
    for record in ledger {
        surface.fill_triangle(arrowhead(record), ARROW_RED, ARROW_ALPHA);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::streak::StreakRecord;

    use super::*;

    fn record() -> StreakRecord {
        StreakRecord {
            x: 20,
            y: 10,
            length: 30.0,
            alpha: 0.4,
            line_width: 1.0,
        }
    }

    #[test]
    fn arrowhead_sits_at_the_tail_pointing_down() {
        let pts = arrowhead(&record());
        assert_eq!(pts[0], (17.5, 40.0));
        assert_eq!(pts[1], (22.5, 40.0));
        assert_eq!(pts[2], (20.0, 45.0));
    }

    #[test]
    fn draw_vectors_leaves_the_ledger_untouched() {
        let mut ledger = StreakLedger::new();
        ledger.push(record());
        let before = ledger.clone();

        let mut surface = Surface::new(64).unwrap();
        draw_vectors(&mut surface, &ledger).unwrap();

        assert_eq!(ledger, before);
    }

    #[test]
    fn draw_vectors_paints_red_at_each_tail() {
        let mut ledger = StreakLedger::new();
        ledger.push(record());

        let mut surface = Surface::new(64).unwrap();
        surface.fill_canvas([0, 0, 0], 1.0);
        draw_vectors(&mut surface, &ledger).unwrap();

        let frame = surface.snapshot();
        // just below the tail (20, 40), inside the triangle
        let idx = ((42 * frame.width + 20) * 4) as usize;
        let px = &frame.data[idx..idx + 4];
        assert!(px[0] > 150, "expected strong red, got {px:?}");
        assert!(px[1] < 60);
        assert!(px[2] < 60);
    }
}
