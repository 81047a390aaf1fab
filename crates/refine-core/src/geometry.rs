//! Overlay placement relative to a selection anchor and a moving viewport.
//!
//! All inputs are in CSS-pixel coordinates. Anchor rectangles are
//! viewport-relative (as a bounding client rect would be); computed `top` /
//! `left` positions are page coordinates, so they stay attached to the
//! document when it scrolls. Placement is a pure function: identical inputs
//! always produce the identical position.

use serde::{Deserialize, Serialize};

/// Gap kept between the anchor and the overlay, and between the overlay and
/// any viewport edge it is clamped against.
pub const PLACEMENT_MARGIN: f64 = 10.0;

/// An axis-aligned rectangle in viewport-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Zero-area rectangles cannot anchor anything.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// The rectangle grown by `dx`/`dy` on every side.
    pub fn expanded(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            left: self.left - dx,
            top: self.top - dy,
            width: self.width + 2.0 * dx,
            height: self.height + 2.0 * dy,
        }
    }
}

/// The visible viewport: its size plus the document scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// The viewport as a viewport-relative rect (origin at 0,0).
    pub fn client_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Measured size of the overlay box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Which side of the anchor the overlay sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalSide {
    Above,
    Below,
}

/// A computed overlay placement. Never persisted across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPosition {
    /// The (sanitized) anchor the position was computed against.
    pub anchor_rect: Rect,
    pub vertical_side: VerticalSide,
    /// Page-coordinate top edge of the overlay.
    pub top: f64,
    /// Page-coordinate left edge of the overlay.
    pub left: f64,
}

/// Outcome of a reposition pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Reposition {
    Moved(OverlayPosition),
    NoChange,
}

/// Replace unusable anchors with a synthetic one in the upper third of the
/// viewport. Selections inside zero-size or far-off-screen ranges would
/// otherwise produce undefined geometry.
fn sanitize_anchor(anchor: Rect, viewport: &Viewport) -> Rect {
    let plausible = viewport
        .client_rect()
        .expanded(viewport.width, viewport.height);
    if anchor.is_degenerate() || !anchor.intersects(&plausible) {
        let width = (viewport.width / 3.0).max(1.0);
        Rect::new(
            (viewport.width - width) / 2.0,
            viewport.height / 3.0,
            width,
            1.0,
        )
    } else {
        anchor
    }
}

fn vertical_space(anchor: &Rect, viewport: &Viewport) -> (f64, f64) {
    let above = anchor.top;
    let below = viewport.height - anchor.bottom();
    (above, below)
}

fn top_for_side(side: VerticalSide, anchor: &Rect, overlay: Size, viewport: &Viewport) -> f64 {
    match side {
        VerticalSide::Below => anchor.bottom() + viewport.scroll_y + PLACEMENT_MARGIN,
        VerticalSide::Above => {
            anchor.top + viewport.scroll_y - overlay.height - PLACEMENT_MARGIN
        }
    }
}

fn clamp_top(top: f64, overlay: Size, viewport: &Viewport) -> f64 {
    let min = viewport.scroll_y + PLACEMENT_MARGIN;
    let max = viewport.scroll_y + viewport.height - overlay.height - PLACEMENT_MARGIN;
    if top < min {
        min
    } else if top > max {
        max.max(min)
    } else {
        top
    }
}

fn horizontal_position(anchor: &Rect, overlay: Size, viewport: &Viewport) -> f64 {
    let mut left = anchor.left + viewport.scroll_x;
    // Shift left if the overlay would overflow the right edge.
    if left + overlay.width > viewport.scroll_x + viewport.width {
        left = anchor.right() + viewport.scroll_x - overlay.width;
    }
    // Clamp to the viewport's left edge as a last resort.
    if left < viewport.scroll_x {
        left = viewport.scroll_x + PLACEMENT_MARGIN;
    }
    left
}

/// Compute the initial overlay placement for a selection anchor.
///
/// Below the anchor is preferred when there is room for the overlay plus the
/// fixed margin; otherwise above; otherwise whichever side has strictly more
/// space, clamped inside the viewport so the overlay never renders
/// off-screen.
pub fn place(overlay: Size, anchor: Rect, viewport: &Viewport) -> OverlayPosition {
    let anchor = sanitize_anchor(anchor, viewport);
    let (above, below) = vertical_space(&anchor, viewport);

    let side = if below >= overlay.height + PLACEMENT_MARGIN {
        VerticalSide::Below
    } else if above >= overlay.height + PLACEMENT_MARGIN {
        VerticalSide::Above
    } else if above > below {
        VerticalSide::Above
    } else {
        VerticalSide::Below
    };

    let top = clamp_top(top_for_side(side, &anchor, overlay, viewport), overlay, viewport);
    let left = horizontal_position(&anchor, overlay, viewport);

    OverlayPosition {
        anchor_rect: anchor,
        vertical_side: side,
        top,
        left,
    }
}

/// Re-evaluate an existing placement after the overlay grew, the page
/// scrolled, or the viewport resized.
///
/// The current side is kept unless the opposite side now has both sufficient
/// space and strictly more of it (hysteresis against flip flicker). Without a
/// flip the position is merely clamped back inside the viewport.
pub fn reposition(
    overlay: Size,
    anchor: Rect,
    viewport: &Viewport,
    current: &OverlayPosition,
) -> Reposition {
    let anchor = sanitize_anchor(anchor, viewport);
    let (above, below) = vertical_space(&anchor, viewport);

    let (current_space, opposite_space, opposite) = match current.vertical_side {
        VerticalSide::Below => (below, above, VerticalSide::Above),
        VerticalSide::Above => (above, below, VerticalSide::Below),
    };

    let side = if opposite_space >= overlay.height + PLACEMENT_MARGIN
        && opposite_space > current_space
        && current_space < overlay.height + PLACEMENT_MARGIN
    {
        opposite
    } else {
        current.vertical_side
    };

    let top = clamp_top(top_for_side(side, &anchor, overlay, viewport), overlay, viewport);
    let left = horizontal_position(&anchor, overlay, viewport);

    let next = OverlayPosition {
        anchor_rect: anchor,
        vertical_side: side,
        top,
        left,
    };

    if next == *current {
        Reposition::NoChange
    } else {
        Reposition::Moved(next)
    }
}
