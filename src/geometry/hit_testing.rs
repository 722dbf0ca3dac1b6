use egui::{CursorIcon, Pos2, Rect, Vec2};

/// Half-size of the square grab zone around each frame handle, in image pixels.
pub const HANDLE_TOLERANCE: f32 = 10.0;

/// One of the eight resize grab zones of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    E,
    W,
}

impl ResizeHandle {
    /// Hit-test order: corners first, then the vertical edges, then the horizontal ones
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Nw,
        ResizeHandle::Ne,
        ResizeHandle::Sw,
        ResizeHandle::Se,
        ResizeHandle::W,
        ResizeHandle::E,
        ResizeHandle::N,
        ResizeHandle::S,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeHandle::Nw => "nw",
            ResizeHandle::Ne => "ne",
            ResizeHandle::Sw => "sw",
            ResizeHandle::Se => "se",
            ResizeHandle::N => "n",
            ResizeHandle::S => "s",
            ResizeHandle::E => "e",
            ResizeHandle::W => "w",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            ResizeHandle::Nw => CursorIcon::ResizeNorthWest,
            ResizeHandle::Ne => CursorIcon::ResizeNorthEast,
            ResizeHandle::Sw => CursorIcon::ResizeSouthWest,
            ResizeHandle::Se => CursorIcon::ResizeSouthEast,
            ResizeHandle::N => CursorIcon::ResizeNorth,
            ResizeHandle::S => CursorIcon::ResizeSouth,
            ResizeHandle::E => CursorIcon::ResizeEast,
            ResizeHandle::W => CursorIcon::ResizeWest,
        }
    }

    /// Where the handle marker sits on `rect`
    pub fn anchor(&self, rect: Rect) -> Pos2 {
        let center = rect.center();
        match self {
            ResizeHandle::Nw => rect.left_top(),
            ResizeHandle::Ne => rect.right_top(),
            ResizeHandle::Sw => rect.left_bottom(),
            ResizeHandle::Se => rect.right_bottom(),
            ResizeHandle::N => Pos2::new(center.x, rect.min.y),
            ResizeHandle::S => Pos2::new(center.x, rect.max.y),
            ResizeHandle::E => Pos2::new(rect.max.x, center.y),
            ResizeHandle::W => Pos2::new(rect.min.x, center.y),
        }
    }

    /// Move the edges touching this handle by `delta`; the opposite edges stay put.
    ///
    /// The result may be inverted or tiny; callers validate it.
    pub fn apply(&self, initial: Rect, delta: Vec2) -> Rect {
        let mut rect = initial;
        match self {
            ResizeHandle::Nw => rect.min += delta,
            ResizeHandle::Ne => {
                rect.min.y += delta.y;
                rect.max.x += delta.x;
            }
            ResizeHandle::Sw => {
                rect.min.x += delta.x;
                rect.max.y += delta.y;
            }
            ResizeHandle::Se => rect.max += delta,
            ResizeHandle::N => rect.min.y += delta.y,
            ResizeHandle::S => rect.max.y += delta.y,
            ResizeHandle::E => rect.max.x += delta.x,
            ResizeHandle::W => rect.min.x += delta.x,
        }
        rect
    }

    fn zone(&self, rect: Rect, tolerance: f32) -> Rect {
        let t = tolerance;
        match self {
            ResizeHandle::Nw | ResizeHandle::Ne | ResizeHandle::Sw | ResizeHandle::Se => {
                Rect::from_center_size(self.anchor(rect), Vec2::splat(2.0 * t))
            }
            // Edge zones only span the frame itself; the corner zones cover the rest.
            ResizeHandle::W => Rect::from_min_max(
                Pos2::new(rect.min.x - t, rect.min.y),
                Pos2::new(rect.min.x + t, rect.max.y),
            ),
            ResizeHandle::E => Rect::from_min_max(
                Pos2::new(rect.max.x - t, rect.min.y),
                Pos2::new(rect.max.x + t, rect.max.y),
            ),
            ResizeHandle::N => Rect::from_min_max(
                Pos2::new(rect.min.x, rect.min.y - t),
                Pos2::new(rect.max.x, rect.min.y + t),
            ),
            ResizeHandle::S => Rect::from_min_max(
                Pos2::new(rect.min.x, rect.max.y - t),
                Pos2::new(rect.max.x, rect.max.y + t),
            ),
        }
    }
}

/// Grab tolerance for a frame: never smaller than its stroke, so thick borders stay grabbable.
pub fn handle_tolerance(base: f32, border_width: f32) -> f32 {
    base.max(border_width)
}

/// First handle of the frame `rect` whose zone contains `pos`.
pub fn handle_at(rect: Rect, tolerance: f32, pos: Pos2) -> Option<ResizeHandle> {
    ResizeHandle::ALL
        .into_iter()
        .find(|handle| handle.zone(rect, tolerance).contains(pos))
}

/// Box of a single line of text drawn baseline-left at `anchor`: it sits
/// above the baseline and extends right by the measured advance.
pub fn text_bounds(anchor: Pos2, advance: f32, font_size: f32) -> Rect {
    Rect::from_min_max(
        Pos2::new(anchor.x, anchor.y - font_size),
        Pos2::new(anchor.x + advance, anchor.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_rect() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0))
    }

    #[test]
    fn test_corner_zones() {
        let rect = frame_rect();
        assert_eq!(handle_at(rect, 10.0, Pos2::new(95.0, 95.0)), Some(ResizeHandle::Nw));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(305.0, 105.0)), Some(ResizeHandle::Ne));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(100.0, 200.0)), Some(ResizeHandle::Sw));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(309.0, 209.0)), Some(ResizeHandle::Se));
    }

    #[test]
    fn test_edge_zones() {
        let rect = frame_rect();
        assert_eq!(handle_at(rect, 10.0, Pos2::new(92.0, 150.0)), Some(ResizeHandle::W));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(308.0, 150.0)), Some(ResizeHandle::E));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(200.0, 92.0)), Some(ResizeHandle::N));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(200.0, 205.0)), Some(ResizeHandle::S));
        assert_eq!(handle_at(rect, 10.0, Pos2::new(200.0, 150.0)), None);
        assert_eq!(handle_at(rect, 10.0, Pos2::new(200.0, 250.0)), None);
    }

    #[test]
    fn test_thick_border_widens_zone() {
        let rect = frame_rect();
        let pos = Pos2::new(200.0, 115.0);
        assert_eq!(handle_at(rect, handle_tolerance(10.0, 2.0), pos), None);
        assert_eq!(handle_at(rect, handle_tolerance(10.0, 20.0), pos), Some(ResizeHandle::N));
    }

    #[test]
    fn test_apply_keeps_opposite_edges() {
        let rect = frame_rect();
        let delta = Vec2::new(10.0, -20.0);

        let nw = ResizeHandle::Nw.apply(rect, delta);
        assert_eq!(nw.max, rect.max);
        assert_eq!(nw.min, Pos2::new(110.0, 80.0));

        let se = ResizeHandle::Se.apply(rect, delta);
        assert_eq!(se.min, rect.min);
        assert_eq!(se.size(), Vec2::new(210.0, 80.0));

        let e = ResizeHandle::E.apply(rect, delta);
        assert_eq!(e.height(), rect.height());
        assert_eq!(e.width(), 210.0);

        let n = ResizeHandle::N.apply(rect, delta);
        assert_eq!(n.width(), rect.width());
        assert_eq!(n.min.y, 80.0);
    }

    #[test]
    fn test_text_bounds_sit_above_baseline() {
        let bounds = text_bounds(Pos2::new(10.0, 50.0), 80.0, 20.0);
        assert!(bounds.contains(Pos2::new(20.0, 40.0)));
        assert!(!bounds.contains(Pos2::new(20.0, 55.0)));
    }
}
