/// Order in which messages are returned relative to `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A validated page request.
///
/// The page number is taken by magnitude, so `-2` addresses the same page as `2`.
/// Page `0` addresses the first page. A size of `0` places no limit on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn new(number: i32, size: u32) -> Self {
        let magnitude = number.unsigned_abs();
        Self { number: if magnitude == 0 { 1 } else { magnitude }, size }
    }

    #[must_use]
    pub const fn first(size: u32) -> Self {
        Self { number: 1, size }
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of records skipped before this page: `size * (|number| - 1)`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.size) * (u64::from(self.number) - 1)
    }

    /// Maximum records on this page; `None` when the size is `0`.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        (self.size > 0).then(|| u64::from(self.size))
    }
}
