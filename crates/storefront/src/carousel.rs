//! Wrap-around index arithmetic for image carousels.
//!
//! The start index is stored unbounded and only folded into `[0, len)` when
//! read, so repeated `next`/`previous` presses never need the list length.

/// `i mod n` folded into `[0, n)`. `None` when `n == 0`.
pub fn bound_index(i: i64, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let n = i64::try_from(n).unwrap_or(i64::MAX);
    // rem_euclid is never negative for a positive modulus.
    usize::try_from(i.rem_euclid(n)).ok()
}

/// `num_visible` indices starting at `bound_index(start_index, len)`,
/// wrapping past the end. Empty when either count is zero.
pub fn visible_images(start_index: i64, num_visible: usize, len: usize) -> Vec<usize> {
    let Some(first) = bound_index(start_index, len) else {
        return Vec::new();
    };
    (0..num_visible).map(|offset| (first + offset) % len).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carousel {
    start_index: i64,
    num_visible: usize,
}

impl Carousel {
    pub fn new(start_index: i64, num_visible: usize) -> Self {
        Self {
            start_index,
            num_visible,
        }
    }

    pub fn start_index(&self) -> i64 {
        self.start_index
    }

    pub fn num_visible(&self) -> usize {
        self.num_visible
    }

    pub fn set_num_visible(&mut self, num_visible: usize) {
        self.num_visible = num_visible;
    }

    pub fn next_image(&mut self) {
        self.start_index = self.start_index.wrapping_add(1);
    }

    pub fn previous_image(&mut self) {
        self.start_index = self.start_index.wrapping_sub(1);
    }

    pub fn visible(&self, len: usize) -> Vec<usize> {
        visible_images(self.start_index, self.num_visible, len)
    }

    /// The image currently at the front of the carousel.
    pub fn current(&self, len: usize) -> Option<usize> {
        bound_index(self.start_index, len)
    }
}
