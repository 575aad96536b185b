pub const PANE_FULL_WIDTH: f64 = 625.0;
pub const PANE_STICKY_WIDTH: f64 = 40.0;
pub const PANE_WIDTH: f64 = PANE_FULL_WIDTH - PANE_STICKY_WIDTH;

const STICKY_PANES_LEFT_COUNT: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanesLayoutState {
    pub scroll_x: f64,
    pub offset_width: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaneStyles {
    pub i: usize,
    pub sticky_left_offset: f64,
    pub sticky_right_offset: f64,
    pub z_index: i32,
    pub collapse_x: f64,
    pub collapsed_progress: f64,
    pub is_collapsed: bool,
    pub scroll_x: f64,
    pub scroll_x_progress: f64,
    pub is_scrolling: bool,
    pub has_shadow: bool,
    pub in_viewport_x: f64,
    pub in_viewport_progress: f64,
    pub is_in_viewport: bool,
    pub should_render: bool,
}

pub fn panes_width(count: usize) -> f64 {
    PANE_FULL_WIDTH * count as f64
}

// Left margin compression once more than three panes' worth of scroll has
// accumulated, so collapsed tabs don't pile up against the left edge.
pub fn panes_offset(state: &PanesLayoutState) -> f64 {
    let panes_progress = state.scroll_x / PANE_WIDTH;
    (panes_progress - STICKY_PANES_LEFT_COUNT).max(0.0) * PANE_STICKY_WIDTH
}

pub fn pane_scroll_x(i: usize) -> f64 {
    PANE_WIDTH * i as f64
}

pub fn pane_styles(
    i: usize,
    panes_scroll_x: f64,
    panes_offset_width: f64,
    panes_offset: f64,
    previous: Option<&PaneStyles>,
) -> PaneStyles {
    let sticky_left_offset = i as f64 * PANE_STICKY_WIDTH - panes_offset;

    // The right edge retreats off-screen unless the next-older pane is still
    // substantially in view, in which case a sliver stays to receive this
    // pane's left tab.
    let previous_viewport_progress = previous.map(|p| p.in_viewport_progress).unwrap_or(0.0);
    let sticky_in_viewport = PANE_STICKY_WIDTH * clamp(previous_viewport_progress / 0.4, 0.0, 1.0);
    let sticky_right_offset = -PANE_FULL_WIDTH + sticky_in_viewport;

    // Panes past the scrolled frontier drop to the bottom of the stacking
    // order; everything inside it stacks strictly above its left neighbour.
    let frontier = ((panes_scroll_x + panes_offset_width) / PANE_FULL_WIDTH).ceil();
    let z_index = if i as f64 > frontier {
        0
    } else {
        previous.map(|p| p.z_index).unwrap_or(0) + 1
    };

    let collapse_x = clamp(
        panes_scroll_x - panes_offset - i as f64 * PANE_WIDTH,
        0.0,
        PANE_WIDTH,
    );
    let collapsed_progress = collapse_x / PANE_WIDTH;
    let is_collapsed = collapsed_progress == 1.0;

    // Scroll feedback tracks how far the left neighbour has collapsed, not
    // this pane's own position.
    let scroll_x = previous.map(|p| p.collapse_x).unwrap_or(0.0);
    let scroll_x_progress = previous.map(|p| p.collapsed_progress).unwrap_or(0.0);
    let is_scrolling = scroll_x_progress > 0.0 && scroll_x_progress < 1.0;
    let has_shadow = previous.is_some() && scroll_x_progress > 0.0;

    let in_viewport_x =
        PANE_FULL_WIDTH.min(panes_offset_width + panes_scroll_x - i as f64 * PANE_FULL_WIDTH);
    let in_viewport_progress = in_viewport_x / PANE_FULL_WIDTH;
    let is_in_viewport = in_viewport_progress == 1.0;

    let should_render =
        in_viewport_progress <= -1.0 || sticky_left_offset >= -PANE_STICKY_WIDTH;

    PaneStyles {
        i,
        sticky_left_offset,
        sticky_right_offset,
        z_index,
        collapse_x,
        collapsed_progress,
        is_collapsed,
        scroll_x,
        scroll_x_progress,
        is_scrolling,
        has_shadow,
        in_viewport_x,
        in_viewport_progress,
        is_in_viewport,
        should_render,
    }
}

// A left fold: each pane's computation needs its left neighbour's result.
pub fn compute_stack(state: &PanesLayoutState, count: usize) -> Vec<PaneStyles> {
    let panes_offset = panes_offset(state);
    let mut styles = Vec::with_capacity(count);
    for i in 0..count {
        let next = pane_styles(
            i,
            state.scroll_x,
            state.offset_width,
            panes_offset,
            styles.last(),
        );
        styles.push(next);
    }
    styles
}

impl PaneStyles {
    pub fn container_style(&self) -> String {
        let box_shadow = if self.has_shadow {
            format!(
                "0 0 16px 0 rgba(0, 0, 0, {})",
                self.scroll_x_progress.min(0.1)
            )
        } else {
            "none".to_string()
        };
        format!(
            "width: {}px; left: {}px; right: {}px; z-index: {}; box-shadow: {};",
            PANE_FULL_WIDTH, self.sticky_left_offset, self.sticky_right_offset, self.z_index, box_shadow
        )
    }

    pub fn background_style(&self) -> String {
        format!(
            "opacity: {}; display: {};",
            self.background_opacity(),
            self.display()
        )
    }

    pub fn foreground_style(&self) -> String {
        format!(
            "opacity: {}; display: {};",
            self.foreground_opacity(),
            self.display()
        )
    }

    // The title layer fades out over the first 20% of a pane's entry into
    // the viewport and comes back in full once the pane is collapsed.
    pub fn background_opacity(&self) -> f64 {
        if self.is_collapsed {
            1.0
        } else {
            clamp(1.0 - self.in_viewport_progress / 0.2, 0.0, 1.0)
        }
    }

    // Content fades in over the first 40% of entry and back out over the
    // last 40% of collapse.
    pub fn foreground_opacity(&self) -> f64 {
        let raw = if self.in_viewport_progress < 1.0 {
            self.in_viewport_progress
        } else {
            1.0 - self.collapsed_progress
        };
        clamp(raw / 0.4, 0.0, 1.0)
    }

    fn display(&self) -> &'static str {
        if self.should_render {
            "block"
        } else {
            "none"
        }
    }
}

fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.min(max).max(min)
}
