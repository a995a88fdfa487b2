pub const DEFAULT_LOOKAHEAD_MARGIN: u32 = 300;

/// Fires a "load more" when the end-of-list sentinel comes within `margin` layout units of the
/// viewport. At most one fire per visible period: the sentinel has to be observed out of range
/// before the trigger re-arms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollTrigger {
    margin: u32,
    visible: bool,
    fired: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD_MARGIN)
    }
}

impl ScrollTrigger {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            visible: false,
            fired: false,
        }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// `sentinel` and `viewport_end` are offsets from the top of the list. `eligible` is the
    /// fetch controller's answer to "may a page be requested now".
    pub fn observe(&mut self, sentinel: u32, viewport_end: u32, eligible: bool) -> bool {
        self.visible = sentinel <= viewport_end.saturating_add(self.margin);
        if !self.visible {
            self.fired = false;
            return false;
        }
        if self.fired || !eligible {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn reset(&mut self) {
        self.visible = false;
        self.fired = false;
    }
}
