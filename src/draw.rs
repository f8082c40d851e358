//! Lines, rectangles and circles
//!
//! Every shape is built from [`FrameBuffer::set_pixel`], so everything clips.
//! Thick strokes repeat the 1px shape at offset positions rather than
//! stroking an outline; a thick line is visually centered and a thick circle
//! shrinks its radius by one per pass.

use crate::error::DrawError;
use crate::framebuffer::{FrameBuffer, HEIGHT, WIDTH};

type DrawResult = Result<(), DrawError>;

fn check_width(width: i32) -> DrawResult {
    if width <= 0 {
        return Err(DrawError::InvalidArgument {
            name: "width",
            value: width,
        });
    }
    Ok(())
}

impl FrameBuffer {
    /// Draw a line `width` pixels thick, both end points included
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidArgument` if `width` is not positive.
    pub fn line(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        width: i32,
        black: bool,
    ) -> DrawResult {
        check_width(width)?;
        let offsets = (-width).div_euclid(2) + 1..width / 2 + 1;
        let dx = (i64::from(x1) - i64::from(x0)).abs();
        let dy = (i64::from(y1) - i64::from(y0)).abs();
        if dx > dy {
            for w in offsets {
                self.thin_line(x0, y0.saturating_add(w), x1, y1.saturating_add(w), black);
            }
        } else {
            for w in offsets {
                self.thin_line(x0.saturating_add(w), y0, x1.saturating_add(w), y1, black);
            }
        }
        Ok(())
    }

    /// Draw a rectangle outline between two corners, `width` pixels thick
    ///
    /// Corners may be given in any order; thickness grows inward.
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidArgument` if `width` is not positive.
    pub fn rect(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        width: i32,
        black: bool,
    ) -> DrawResult {
        check_width(width)?;
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        for w in 0..width {
            let (l, t) = (left.saturating_add(w), top.saturating_add(w));
            let (r, b) = (right.saturating_sub(w), bottom.saturating_sub(w));
            self.thin_line(l, t, r, t, black);
            self.thin_line(l, t, l, b, black);
            self.thin_line(l, b, r, b, black);
            self.thin_line(r, t, r, b, black);
        }
        Ok(())
    }

    /// Fill the rectangle from `(x0, y0)` up to but excluding `(x1, y1)`
    ///
    /// Corners may be given in any order.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, black: bool) {
        let (left, right) = (x0.min(x1).max(0), x0.max(x1).min(WIDTH));
        let (top, bottom) = (y0.min(y1).max(0), y0.max(y1).min(HEIGHT));
        for x in left..right {
            for y in top..bottom {
                self.set_pixel(x, y, black);
            }
        }
    }

    /// Draw a circle outline of radius `r`, `width` pixels thick
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidArgument` if `r` is negative or `width` is not
    /// positive.
    pub fn circle(&mut self, x0: i32, y0: i32, r: i32, width: i32, black: bool) -> DrawResult {
        check_radius(r)?;
        check_width(width)?;
        for radius in (r.saturating_sub(width - 1)..=r).rev() {
            for_circle(radius, |x, y| {
                let (left, right) = (x0.saturating_add(x), x0.saturating_sub(x));
                let (top, bottom) = (y0.saturating_sub(y), y0.saturating_add(y));
                self.set_pixel(right, bottom, black);
                self.set_pixel(left, bottom, black);
                self.set_pixel(left, top, black);
                self.set_pixel(right, top, black);
            });
        }
        Ok(())
    }

    /// Draw a filled circle of radius `r`
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidArgument` if `r` is negative.
    pub fn fill_circle(&mut self, x0: i32, y0: i32, r: i32, black: bool) -> DrawResult {
        check_radius(r)?;
        for_circle(r, |x, y| {
            let (top, bottom) = (y0.saturating_sub(y), y0.saturating_add(y));
            for column in [x0.saturating_sub(x), x0.saturating_add(x)] {
                self.thin_line(column, top, column, bottom, black);
            }
        });
        Ok(())
    }

    /// 1px Bresenham line, both end points included
    fn thin_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, black: bool) {
        let dx = i64::from(x1) - i64::from(x0);
        let dy = i64::from(y1) - i64::from(y0);
        if dx.abs() >= dy.abs() {
            for_line_steps(x0, y0, dx, dy, WIDTH, |x, y| self.set_pixel(x, y, black));
        } else {
            for_line_steps(y0, x0, dy, dx, HEIGHT, |y, x| self.set_pixel(x, y, black));
        }
    }
}

/// Bresenham steps along the major axis `a`, limited to `0..limit`
///
/// Step `k` is at `a0 ± k` and `b0 ± (2k|db| + |da|) / 2|da|`, which is where
/// the incremental walk lands; steps off the panel are never visited.
fn for_line_steps(a0: i32, b0: i32, da: i64, db: i64, limit: i32, mut plot: impl FnMut(i32, i32)) {
    let (a0, b0, limit) = (i64::from(a0), i64::from(b0), i64::from(limit));
    let sa = if da > 0 { 1 } else { -1 };
    let sb = if db > 0 { 1 } else { -1 };
    let (steps, minor) = (da.abs(), db.abs());
    let (first, last) = if sa > 0 {
        (-a0, limit - 1 - a0)
    } else {
        (a0 - limit + 1, a0)
    };
    for k in first.max(0)..=last.min(steps) {
        let m = if steps == 0 {
            0
        } else {
            let twice_steps = 2 * i128::from(steps);
            ((2 * i128::from(k) * i128::from(minor) + i128::from(steps)) / twice_steps) as i64
        };
        plot((a0 + sa * k) as i32, (b0 + sb * m) as i32);
    }
}

fn check_radius(r: i32) -> DrawResult {
    if r < 0 {
        return Err(DrawError::InvalidArgument {
            name: "r",
            value: r,
        });
    }
    Ok(())
}

/// Midpoint circle walk over one quadrant, `(x, y)` offsets with `x <= 0`
fn for_circle(r: i32, mut plot: impl FnMut(i32, i32)) {
    if r < 0 {
        return;
    }
    let mut x = -r;
    let mut y = 0;
    let mut err = 2 - 2 * i64::from(r);
    while x <= 0 {
        plot(x, y);
        let mut e2 = err;
        if e2 <= i64::from(y) {
            y += 1;
            err += i64::from(y) * 2 + 1;
            if -x == y && e2 <= i64::from(x) {
                e2 = 0;
            }
        }
        if e2 > i64::from(x) {
            x += 1;
            err += i64::from(x) * 2 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_pixels(frame: &FrameBuffer) -> usize {
        frame
            .as_bytes()
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum()
    }

    #[test]
    fn test_horizontal_line_end_points() {
        let mut frame = FrameBuffer::new();
        frame.line(0, 0, 10, 0, 1, true).unwrap();
        for x in 0..=10 {
            assert!(frame.pixel(x, 0));
        }
        assert_eq!(black_pixels(&frame), 11);
    }

    #[test]
    fn test_thick_line_is_centered() {
        let mut frame = FrameBuffer::new();
        frame.line(5, 20, 50, 20, 3, true).unwrap();
        assert!(frame.pixel(5, 19));
        assert!(frame.pixel(5, 20));
        assert!(frame.pixel(5, 21));
        assert!(!frame.pixel(5, 22));
        assert_eq!(black_pixels(&frame), 46 * 3);
    }

    #[test]
    fn test_steep_line_offsets_horizontally() {
        let mut frame = FrameBuffer::new();
        frame.line(30, 0, 30, 9, 2, true).unwrap();
        assert!(frame.pixel(30, 0));
        assert!(frame.pixel(31, 9));
        assert!(!frame.pixel(29, 5));
        assert_eq!(black_pixels(&frame), 20);
    }

    #[test]
    fn test_diagonal_line() {
        let mut frame = FrameBuffer::new();
        frame.line(10, 10, 0, 0, 1, true).unwrap();
        for i in 0..=10 {
            assert!(frame.pixel(i, i));
        }
        assert_eq!(black_pixels(&frame), 11);
    }

    #[test]
    fn test_rejects_bad_width_and_radius() {
        let mut frame = FrameBuffer::new();
        assert_eq!(
            frame.line(0, 0, 5, 5, 0, true),
            Err(DrawError::InvalidArgument {
                name: "width",
                value: 0,
            })
        );
        assert!(frame.rect(0, 0, 5, 5, -2, true).is_err());
        assert_eq!(
            frame.circle(50, 50, -1, 1, true),
            Err(DrawError::InvalidArgument {
                name: "r",
                value: -1,
            })
        );
        assert!(frame.fill_circle(50, 50, -3, true).is_err());
        assert_eq!(black_pixels(&frame), 0);
    }

    #[test]
    fn test_rect_draw_then_erase_restores_buffer() {
        let mut frame = FrameBuffer::new();
        frame.fill_rect(0, 0, 40, 40, true);
        frame.set_pixel(100, 100, true);
        let before = frame.clone();
        frame.rect(90, 95, 120, 130, 4, true).unwrap();
        assert_ne!(frame, before);
        frame.rect(90, 95, 120, 130, 4, false).unwrap();
        frame.set_pixel(100, 100, true);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_rect_corners_any_order() {
        let mut a = FrameBuffer::new();
        let mut b = FrameBuffer::new();
        a.rect(10, 10, 20, 30, 2, true).unwrap();
        b.rect(20, 30, 10, 10, 2, true).unwrap();
        assert_eq!(a, b);
        assert!(a.pixel(11, 11));
        assert!(!a.pixel(12, 12));
    }

    #[test]
    fn test_fill_rect_excludes_far_edges() {
        let mut frame = FrameBuffer::new();
        frame.fill_rect(4, 4, 8, 6, true);
        assert_eq!(black_pixels(&frame), 8);
        assert!(frame.pixel(7, 5));
        assert!(!frame.pixel(8, 5));
        assert!(!frame.pixel(7, 6));
    }

    #[test]
    fn test_circle_extremes() {
        let mut frame = FrameBuffer::new();
        frame.circle(100, 80, 10, 1, true).unwrap();
        for (x, y) in [(90, 80), (110, 80), (100, 70), (100, 90)] {
            assert!(frame.pixel(x, y), "({x}, {y})");
        }
        assert!(!frame.pixel(100, 80));
    }

    #[test]
    fn test_zero_radius_is_a_dot() {
        let mut frame = FrameBuffer::new();
        frame.circle(5, 5, 0, 1, true).unwrap();
        assert_eq!(black_pixels(&frame), 1);
        frame.fill_circle(50, 50, 0, true).unwrap();
        assert_eq!(black_pixels(&frame), 2);
    }

    #[test]
    fn test_fill_circle_is_solid() {
        let mut frame = FrameBuffer::new();
        frame.fill_circle(60, 60, 8, true).unwrap();
        for d in -8..=8 {
            assert!(frame.pixel(60 + d, 60));
            assert!(frame.pixel(60, 60 + d));
        }
        assert!(frame.pixel(63, 63));
        assert!(!frame.pixel(68, 68));
    }

    #[test]
    fn test_shapes_clip_at_edges() {
        let mut frame = FrameBuffer::new();
        frame
            .line(-20, -20, WIDTH + 20, HEIGHT + 20, 5, true)
            .unwrap();
        frame.circle(0, 0, 30, 3, true).unwrap();
        frame.fill_circle(WIDTH, HEIGHT, 12, true).unwrap();
        frame.fill_rect(-5, -5, 3, 3, true);
        assert!(frame.pixel(0, 0));
        assert!(frame.pixel(WIDTH - 1, HEIGHT - 1));
    }

    #[test]
    fn test_coordinates_near_limits_clip() {
        let mut frame = FrameBuffer::new();
        frame.line(0, i32::MAX, 10, i32::MAX, 3, true).unwrap();
        frame.line(i32::MIN, 0, i32::MAX, 5, 1, false).unwrap();
        frame
            .rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 3, true)
            .unwrap();
        frame.circle(i32::MAX, i32::MIN, 2, 2, true).unwrap();
        frame.fill_circle(i32::MIN, i32::MAX, 2, true).unwrap();
        frame.fill_rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, false);
        assert_eq!(black_pixels(&frame), 0);
    }

    #[test]
    fn test_long_line_crosses_panel() {
        let mut frame = FrameBuffer::new();
        frame.line(i32::MIN, 10, i32::MAX, 10, 1, true).unwrap();
        assert_eq!(black_pixels(&frame), WIDTH as usize);
        assert!(frame.pixel(0, 10));
        assert!(frame.pixel(WIDTH - 1, 10));
    }

    #[test]
    fn test_clipped_steep_line_keeps_its_slope() {
        let mut frame = FrameBuffer::new();
        // x falls by 1 every 5 rows, starting 20 rows above the panel
        frame.line(44, -20, 16, 120, 1, true).unwrap();
        for y in 0..=120 {
            let on = (0..WIDTH).filter(|&x| frame.pixel(x, y)).count();
            assert_eq!(on, 1, "row {y}");
        }
        assert!(frame.pixel(40, 0));
        assert!(frame.pixel(20, 100));
        assert!(frame.pixel(16, 120));
        assert_eq!(black_pixels(&frame), 121);
    }
}
