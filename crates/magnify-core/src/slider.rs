//! Before/after comparison slider: geometry and drag state machine.
//!
//! Everything here is pure so it can be tested without a DOM. The
//! Dioxus component in `magnify-io` only measures the container, feeds
//! pointer coordinates in, and renders the resulting [`SliderLayout`].
//!
//! The "after" image is visible to the left of the divider and the
//! "before" image to the right, so dragging right reveals more of the
//! result.

use crate::types::Dimensions;

/// Divider position after every [`ImageComparisonSlider::present`].
pub const INITIAL_FRACTION: f64 = 0.5;

/// Container bounds in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width; zero until the container has been laid out.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ContainerRect {
    /// Create a rect from its edges and size.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the container has a usable, non-zero width.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && self.height.is_finite()
    }
}

/// Divider fraction for a pointer at client x-coordinate `x`.
///
/// Always in `[0, 1]`, including for pointers far outside the container.
/// Returns `None` if the container has no width yet or `x` is NaN.
#[must_use]
pub fn compute_divider_fraction(x: f64, rect: ContainerRect) -> Option<f64> {
    if !rect.is_laid_out() || x.is_nan() {
        return None;
    }
    Some(((x - rect.left) / rect.width).clamp(0.0, 1.0))
}

/// Where an image is drawn inside the container, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    /// Horizontal offset from the container's left edge.
    pub x: f64,
    /// Vertical offset from the container's top edge.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

/// Scale `image` to fit a `width` x `height` container, preserving aspect
/// ratio, and centre it with symmetric offsets.
///
/// The scale is `min(width / image.width, height / image.height)`, so
/// small images are enlarged to fill the container as well. Returns
/// `None` for an empty image or container.
#[must_use]
pub fn fit_centered(image: Dimensions, width: f64, height: f64) -> Option<FitRect> {
    if image.is_empty() || !(width > 0.0 && height > 0.0) {
        return None;
    }
    let iw = f64::from(image.width);
    let ih = f64::from(image.height);
    let ratio = (width / iw).min(height / ih);
    let draw_w = iw * ratio;
    let draw_h = ih * ratio;
    Some(FitRect {
        x: (width - draw_w) / 2.0,
        y: (height - draw_h) / 2.0,
        width: draw_w,
        height: draw_h,
    })
}

/// What the pointer was pressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The draggable handle.
    Handle,
    /// Anywhere else on the comparison track.
    Track,
}

/// Divider position and drag flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderState {
    fraction: f64,
    dragging: bool,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            fraction: INITIAL_FRACTION,
            dragging: false,
        }
    }
}

impl SliderState {
    /// Divider position in `[0, 1]`.
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Centre the divider and end any drag.
    pub const fn reset(&mut self) {
        self.fraction = INITIAL_FRACTION;
        self.dragging = false;
    }

    /// Pointer pressed at client x-coordinate `x`.
    ///
    /// A press on the handle starts a drag. A press on the track while not
    /// dragging jumps the divider to the pointer in one step. Returns
    /// `true` if the divider moved.
    pub fn pointer_down(&mut self, target: PointerTarget, x: f64, rect: ContainerRect) -> bool {
        match target {
            PointerTarget::Handle => {
                if rect.is_laid_out() {
                    self.dragging = true;
                }
                false
            }
            PointerTarget::Track if !self.dragging => self.jump_to(x, rect),
            PointerTarget::Track => false,
        }
    }

    /// Pointer moved to client x-coordinate `x`. Only has an effect while
    /// dragging. Returns `true` if the divider moved.
    pub fn pointer_move(&mut self, x: f64, rect: ContainerRect) -> bool {
        self.dragging && self.jump_to(x, rect)
    }

    /// Pointer released, cancelled, or lost (e.g. left the window).
    /// Ends the drag unconditionally.
    pub const fn pointer_up(&mut self) {
        self.dragging = false;
    }

    fn jump_to(&mut self, x: f64, rect: ContainerRect) -> bool {
        match compute_divider_fraction(x, rect) {
            Some(fraction) => {
                let moved = (fraction - self.fraction).abs() > f64::EPSILON;
                self.fraction = fraction;
                moved
            }
            None => false,
        }
    }
}

/// Everything needed to render one frame of the comparison view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderLayout {
    /// Placement of the "before" image.
    pub before: FitRect,
    /// Placement of the "after" image.
    pub after: FitRect,
    /// Divider x-position in container pixels.
    pub divider_x: f64,
    /// Container width.
    pub width: f64,
    /// Container height.
    pub height: f64,
}

impl SliderLayout {
    /// Compute the layout for a container and an image pair.
    ///
    /// Returns `None` while the container is not laid out.
    #[must_use]
    pub fn compute(
        rect: ContainerRect,
        before: Dimensions,
        after: Dimensions,
        fraction: f64,
    ) -> Option<Self> {
        if !rect.is_laid_out() {
            return None;
        }
        Some(Self {
            before: fit_centered(before, rect.width, rect.height)?,
            after: fit_centered(after, rect.width, rect.height)?,
            divider_x: fraction.clamp(0.0, 1.0) * rect.width,
            width: rect.width,
            height: rect.height,
        })
    }

    /// Width hidden on the right of the "after" layer (for an
    /// `inset(0 <right> 0 0)` clip).
    #[must_use]
    pub fn after_clip_right(&self) -> f64 {
        (self.width - self.divider_x).max(0.0)
    }
}

/// The comparison slider: the image pair it shows, the measured
/// container, and the drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageComparisonSlider {
    state: SliderState,
    container: ContainerRect,
    images: Option<(Dimensions, Dimensions)>,
}

impl ImageComparisonSlider {
    /// Show a new before/after pair and centre the divider.
    pub const fn present(&mut self, before: Dimensions, after: Dimensions) {
        self.images = Some((before, after));
        self.state.reset();
    }

    /// Record the container bounds once layout is known. A zero-width
    /// measurement is stored but leaves every operation a no-op.
    pub const fn set_container(&mut self, rect: ContainerRect) {
        self.container = rect;
    }

    /// The drag state.
    #[must_use]
    pub const fn state(&self) -> SliderState {
        self.state
    }

    /// Divider position in `[0, 1]`.
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.state.fraction()
    }

    /// See [`SliderState::pointer_down`].
    pub fn pointer_down(&mut self, target: PointerTarget, x: f64) -> bool {
        self.state.pointer_down(target, x, self.container)
    }

    /// See [`SliderState::pointer_move`].
    pub fn pointer_move(&mut self, x: f64) -> bool {
        self.state.pointer_move(x, self.container)
    }

    /// See [`SliderState::pointer_up`].
    pub const fn pointer_up(&mut self) {
        self.state.pointer_up();
    }

    /// Current layout, or `None` before layout or before any pair was
    /// presented.
    #[must_use]
    pub fn layout(&self) -> Option<SliderLayout> {
        let (before, after) = self.images?;
        SliderLayout::compute(self.container, before, after, self.state.fraction())
    }
}
