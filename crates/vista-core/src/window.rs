use std::ops::Range;

/// Frame indices contributing to the background estimate of one target frame.
///
/// The window is two disjoint half-open ranges on either side of the target,
/// each clipped to `[0, total)`. Neither range ever contains the target or any
/// frame within `temporal_offset` of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub left: Range<usize>,
    pub right: Range<usize>,
}

impl Window {
    /// Select the window for frame `index` of a `total`-frame sequence.
    ///
    /// left:  `[max(0, i - t - b), max(0, i - t))`
    /// right: `[min(N, i + t + 1), min(N, i + t + b + 1))`
    pub fn select(
        total: usize,
        index: usize,
        background_frames: usize,
        temporal_offset: usize,
    ) -> Self {
        let left_end = index.saturating_sub(temporal_offset);
        let left_start = left_end.saturating_sub(background_frames);

        let right_start = index
            .saturating_add(temporal_offset)
            .saturating_add(1)
            .min(total);
        let right_end = right_start.saturating_add(background_frames).min(total);

        Self {
            left: left_start..left_end,
            right: right_start..right_end,
        }
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.left.contains(&index) || self.right.contains(&index)
    }

    /// Contributing indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.left.clone().chain(self.right.clone())
    }
}
