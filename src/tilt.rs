//! 3D hover tilt for cards.

/// Maximum rotation around either axis, reached at the element edge.
pub const MAX_TILT_DEG: f64 = 10.0;
pub const PERSPECTIVE_PX: f64 = 1000.0;
pub const HOVER_SCALE: f64 = 1.05;

/// Element bounds in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TiltRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub scale: f64,
}

impl Tilt {
    /// Flat, unscaled pose used when the pointer leaves.
    pub const REST: Tilt = Tilt {
        rotate_x: 0.0,
        rotate_y: 0.0,
        scale: 1.0,
    };

    pub fn to_css(self) -> String {
        format!(
            "perspective({PERSPECTIVE_PX}px) rotateX({}deg) rotateY({}deg) scale3d({s}, {s}, {s})",
            self.rotate_x,
            self.rotate_y,
            s = self.scale
        )
    }
}

/// Tilt for a pointer at client coordinates `(x, y)` over `rect`.
///
/// The pointer's top edge tilts the element back (positive `rotateX`), the
/// right edge turns it right (positive `rotateY`).
pub fn tilt_at(rect: TiltRect, client_x: f64, client_y: f64) -> Tilt {
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    let rotate_y = axis(client_x - rect.left, half_w) * MAX_TILT_DEG;
    let rotate_x = axis(client_y - rect.top, half_h) * -MAX_TILT_DEG;
    Tilt {
        rotate_x: finite(rotate_x),
        rotate_y: finite(rotate_y),
        scale: HOVER_SCALE,
    }
}

/// Signed distance from the centre in half-extents; zero for degenerate extents.
fn axis(position: f64, half: f64) -> f64 {
    if half > 0.0 && half.is_finite() {
        (position - half) / half
    } else {
        0.0
    }
}

// Also folds -0.0 into 0.0 so CSS never sees "-0deg".
fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v + 0.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    const RECT: TiltRect = TiltRect {
        left: 100.0,
        top: 50.0,
        width: 200.0,
        height: 100.0,
    };

    #[test_case(200.0, 100.0, 0.0, 0.0 ; "centre is flat")]
    #[test_case(100.0, 50.0, 10.0, -10.0 ; "top left corner")]
    #[test_case(300.0, 150.0, -10.0, 10.0 ; "bottom right corner")]
    #[test_case(250.0, 100.0, 0.0, 5.0 ; "halfway right")]
    fn test_tilt_at(x: f64, y: f64, rotate_x: f64, rotate_y: f64) {
        let tilt = tilt_at(RECT, x, y);
        assert_eq!(tilt.rotate_x, rotate_x);
        assert_eq!(tilt.rotate_y, rotate_y);
        assert_eq!(tilt.scale, HOVER_SCALE);
    }

    #[test]
    fn test_css_output() {
        assert_eq!(
            tilt_at(RECT, 200.0, 100.0).to_css(),
            "perspective(1000px) rotateX(0deg) rotateY(0deg) scale3d(1.05, 1.05, 1.05)"
        );
        assert_eq!(
            Tilt::REST.to_css(),
            "perspective(1000px) rotateX(0deg) rotateY(0deg) scale3d(1, 1, 1)"
        );
    }

    #[test]
    fn test_zero_size_rect_is_flat() {
        let tilt = tilt_at(TiltRect::default(), 10.0, 10.0);
        assert_eq!(tilt.rotate_x, 0.0);
        assert_eq!(tilt.rotate_y, 0.0);
    }
}
