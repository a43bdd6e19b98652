pub mod conversation;
pub mod health;
pub mod message;

use crate::domain::pagination::PageRequest;

/// Builds a page request from optional caller input.
///
/// A missing size falls back to `default_size`. A negative size counts by its
/// magnitude and `0` leaves the page unbounded.
pub(crate) fn page_request(number: Option<i32>, size: Option<i64>, default_size: u32) -> PageRequest {
    let size = size.map_or(default_size, |size| u32::try_from(size.unsigned_abs()).unwrap_or(u32::MAX));
    PageRequest::new(number.unwrap_or(1), size)
}
