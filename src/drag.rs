use iced::{Point, Size};

/// Pixel threshold within which a dragged edge is pulled onto the screen edge.
pub const SNAP_DISTANCE: f32 = 20.0;

/// Tracks a single pointer-drag gesture against the overlay window.
///
/// The anchor is the pointer's offset inside the window when the gesture
/// started; it stays constant for the whole gesture so the window follows
/// the pointer without jumping.
#[derive(Debug, Default)]
pub struct DragSnap {
    anchor: Option<Point>,
}

impl DragSnap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture. `pointer` is in window-local coordinates.
    pub fn begin(&mut self, pointer: Point) {
        self.anchor = Some(pointer);
    }

    /// Compute the window's new top-left for the current pointer position.
    ///
    /// Returns `None` when no gesture is active; a stray move event without
    /// a preceding press is simply ignored.
    pub fn drag_to(
        &self,
        pointer: Point,
        window_pos: Point,
        window: Size,
        screen: Size,
    ) -> Option<Point> {
        let anchor = self.anchor?;
        let candidate = Point::new(
            window_pos.x + pointer.x - anchor.x,
            window_pos.y + pointer.y - anchor.y,
        );
        Some(snap_to_corner(candidate, window, screen))
    }

    /// End the gesture. Safe to call when none is active.
    pub fn end(&mut self) {
        self.anchor = None;
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Snap a candidate top-left position onto the nearest screen corner.
///
/// Corners are tested in a fixed order (top-left, top-right, bottom-left,
/// bottom-right) and the first full match wins. The right/bottom tests are
/// against the window's far edge, not its origin, so a window is only
/// pulled into a corner when that edge is actually near the screen edge.
/// With no match the candidate passes through untouched; the window may
/// leave the screen.
pub fn snap_to_corner(pos: Point, window: Size, screen: Size) -> Point {
    let near_left = 0.0 <= pos.x && pos.x <= SNAP_DISTANCE;
    let near_top = 0.0 <= pos.y && pos.y <= SNAP_DISTANCE;
    let near_right = screen.width - SNAP_DISTANCE <= pos.x + window.width
        && pos.x + window.width <= screen.width;
    let near_bottom = screen.height - SNAP_DISTANCE <= pos.y + window.height
        && pos.y + window.height <= screen.height;

    if near_left && near_top {
        Point::new(0.0, 0.0)
    } else if near_right && near_top {
        Point::new(screen.width - window.width, 0.0)
    } else if near_left && near_bottom {
        Point::new(0.0, screen.height - window.height)
    } else if near_right && near_bottom {
        Point::new(
            screen.width - window.width,
            screen.height - window.height,
        )
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Size = Size::new(200.0, 100.0);
    const SCREEN: Size = Size::new(1920.0, 1080.0);

    #[test]
    fn test_drag_round_trip_keeps_position() {
        let mut drag = DragSnap::new();
        let start = Point::new(500.0, 300.0);
        drag.begin(Point::new(42.0, 17.0));
        let moved = drag
            .drag_to(Point::new(42.0, 17.0), start, WINDOW, SCREEN)
            .unwrap();
        assert_eq!(moved, start);
    }

    #[test]
    fn test_drag_follows_pointer_delta() {
        let mut drag = DragSnap::new();
        drag.begin(Point::new(10.0, 10.0));
        let moved = drag
            .drag_to(Point::new(25.0, 4.0), Point::new(500.0, 300.0), WINDOW, SCREEN)
            .unwrap();
        assert_eq!(moved, Point::new(515.0, 294.0));
    }

    #[test]
    fn test_drag_without_begin_is_noop() {
        let drag = DragSnap::new();
        let res = drag.drag_to(Point::new(5.0, 5.0), Point::new(100.0, 100.0), WINDOW, SCREEN);
        assert!(res.is_none());
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut drag = DragSnap::new();
        drag.end();
        drag.begin(Point::new(1.0, 1.0));
        drag.end();
        drag.end();
        assert!(!drag.is_active());
        let res = drag.drag_to(Point::new(5.0, 5.0), Point::new(100.0, 100.0), WINDOW, SCREEN);
        assert!(res.is_none());
    }

    #[test]
    fn test_snap_top_left() {
        // Window at (5,5) dragged so the candidate lands at (3,2).
        let mut drag = DragSnap::new();
        drag.begin(Point::new(10.0, 10.0));
        let moved = drag
            .drag_to(Point::new(8.0, 7.0), Point::new(5.0, 5.0), WINDOW, SCREEN)
            .unwrap();
        assert_eq!(moved, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_no_top_right_snap_when_far_edge_past_screen() {
        // x + width = 2100 > 1920, so the far-edge test fails even though
        // x itself is exactly screen_width - snap_distance.
        let pos = snap_to_corner(Point::new(1900.0, 3.0), WINDOW, SCREEN);
        assert_eq!(pos, Point::new(1900.0, 3.0));
    }

    #[test]
    fn test_snap_top_right() {
        // x + width = 1905, inside [1900, 1920].
        let pos = snap_to_corner(Point::new(1705.0, 10.0), WINDOW, SCREEN);
        assert_eq!(pos, Point::new(1720.0, 0.0));
    }

    #[test]
    fn test_snap_bottom_left() {
        // y + height = 1075, inside [1060, 1080].
        let pos = snap_to_corner(Point::new(10.0, 975.0), WINDOW, SCREEN);
        assert_eq!(pos, Point::new(0.0, 980.0));
    }

    #[test]
    fn test_snap_bottom_right() {
        let pos = snap_to_corner(Point::new(1715.0, 970.0), WINDOW, SCREEN);
        assert_eq!(pos, Point::new(1720.0, 980.0));
    }

    #[test]
    fn test_top_left_wins_over_top_right() {
        // A window wide enough that both the top-left and top-right
        // conditions hold at once; the first corner in the order wins.
        let wide = Size::new(1900.0, 100.0);
        let pos = snap_to_corner(Point::new(15.0, 5.0), wide, SCREEN);
        assert_eq!(pos, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_oversized_window_never_matches_far_edges() {
        let huge = Size::new(2000.0, 1200.0);
        let pos = snap_to_corner(Point::new(500.0, 500.0), huge, SCREEN);
        assert_eq!(pos, Point::new(500.0, 500.0));
    }

    #[test]
    fn test_unsnapped_position_is_not_clamped() {
        let pos = snap_to_corner(Point::new(-300.0, 2000.0), WINDOW, SCREEN);
        assert_eq!(pos, Point::new(-300.0, 2000.0));
    }
}
