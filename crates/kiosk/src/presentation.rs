//! Slide-deck navigation state: current slide, swipe recognition and the
//! thumbnail rail's scroll window.

/// Linear, non-wrapping slide cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationViewer {
    len: usize,
    current: usize,
}

impl PresentationViewer {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Returns true when the index changed.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.len {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump straight to `index` (thumbnail tap).  Out-of-range is ignored.
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.len || index == self.current {
            return false;
        }
        self.current = index;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Press and release without horizontal travel beyond the threshold.
    Tap { column: u16, row: u16 },
    /// Finger moved right-to-left: go forward.
    SwipeLeft,
    /// Finger moved left-to-right: go back.
    SwipeRight,
}

/// Turns press/drag/release pointer events into taps and swipes.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    min_distance: u16,
    start: Option<(u16, u16)>,
    last_column: Option<u16>,
}

impl SwipeTracker {
    pub fn new(min_distance: u16) -> Self {
        Self {
            min_distance,
            start: None,
            last_column: None,
        }
    }

    pub fn press(&mut self, column: u16, row: u16) {
        self.start = Some((column, row));
        self.last_column = None;
    }

    pub fn drag(&mut self, column: u16) {
        if self.start.is_some() {
            self.last_column = Some(column);
        }
    }

    /// Finish the gesture.  A release without a preceding press yields nothing.
    pub fn release(&mut self, column: u16) -> Option<Gesture> {
        let (start_col, start_row) = self.start.take()?;
        // A release without any drag counts as a stationary tap.
        let end_col = self.last_column.take().map(|_| column).unwrap_or(start_col);
        let distance = i32::from(start_col) - i32::from(end_col);
        if distance.unsigned_abs() > u32::from(self.min_distance) {
            if distance > 0 {
                Some(Gesture::SwipeLeft)
            } else {
                Some(Gesture::SwipeRight)
            }
        } else {
            Some(Gesture::Tap {
                column: start_col,
                row: start_row,
            })
        }
    }

    pub fn cancel(&mut self) {
        self.start = None;
        self.last_column = None;
    }
}

/// Scroll window over the thumbnail rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbnailRail {
    /// Index of the first visible thumbnail.
    pub offset: usize,
}

impl ThumbnailRail {
    /// Scroll the minimum amount needed for `index` to be fully visible in a
    /// window of `visible` thumbnails; no-op if it already is.
    pub fn ensure_visible(&mut self, index: usize, visible: usize) -> bool {
        if visible == 0 {
            return false;
        }
        if index < self.offset {
            self.offset = index;
            true
        } else if index >= self.offset + visible {
            self.offset = index + 1 - visible;
            true
        } else {
            false
        }
    }

    /// Keep the window inside `[0, len)` after a resize.
    pub fn clamp(&mut self, len: usize, visible: usize) {
        let max_offset = len.saturating_sub(visible);
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_clamps_without_wrap() {
        let mut v = PresentationViewer::new(3);
        assert!(!v.prev());
        assert_eq!(v.current(), 0);
        assert!(v.next());
        assert!(v.next());
        assert!(!v.next());
        assert_eq!(v.current(), 2);
        assert!(v.prev());
        assert_eq!(v.current(), 1);
    }

    #[test]
    fn test_jump() {
        let mut v = PresentationViewer::new(5);
        assert!(v.jump(4));
        assert_eq!(v.current(), 4);
        assert!(!v.jump(5));
        assert!(!v.jump(4));
        assert_eq!(v.current(), 4);
    }

    #[test]
    fn test_empty_deck() {
        let mut v = PresentationViewer::new(0);
        assert!(v.is_empty());
        assert!(!v.next());
        assert!(!v.prev());
        assert!(!v.jump(0));
    }

    #[test]
    fn test_swipe_directions() {
        let mut t = SwipeTracker::new(5);
        t.press(40, 10);
        t.drag(30);
        t.drag(20);
        assert_eq!(t.release(20), Some(Gesture::SwipeLeft));

        t.press(20, 10);
        t.drag(35);
        assert_eq!(t.release(35), Some(Gesture::SwipeRight));
    }

    #[test]
    fn test_short_drag_and_stationary_press_are_taps() {
        let mut t = SwipeTracker::new(5);
        t.press(40, 10);
        t.drag(36);
        assert_eq!(t.release(36), Some(Gesture::Tap { column: 40, row: 10 }));

        t.press(12, 3);
        assert_eq!(t.release(50), Some(Gesture::Tap { column: 12, row: 3 }));
    }

    #[test]
    fn test_release_without_press() {
        let mut t = SwipeTracker::new(5);
        assert_eq!(t.release(10), None);
    }

    #[test]
    fn test_rail_scrolls_nearest_only_when_hidden() {
        let mut rail = ThumbnailRail::default();
        assert!(!rail.ensure_visible(3, 4));
        assert_eq!(rail.offset, 0);
        assert!(rail.ensure_visible(4, 4));
        assert_eq!(rail.offset, 1);
        assert!(rail.ensure_visible(9, 4));
        assert_eq!(rail.offset, 6);
        assert!(!rail.ensure_visible(7, 4));
        assert!(rail.ensure_visible(2, 4));
        assert_eq!(rail.offset, 2);
    }

    #[test]
    fn test_rail_clamp() {
        let mut rail = ThumbnailRail { offset: 8 };
        rail.clamp(10, 4);
        assert_eq!(rail.offset, 6);
        rail.clamp(2, 4);
        assert_eq!(rail.offset, 0);
    }
}
