use crate::types::Row;

/// A backend-native, buffered result set.
///
/// This is the surface a driver bridge exposes once a statement has run:
/// an internal row pointer that can be read forward and repositioned.
/// Implementations must not be shared; the cursor that owns a handle is
/// the only thing that reads or moves it.
pub trait ResultHandle: Send {
    /// Returns the row under the native pointer and moves the pointer forward.
    /// Returns `None` once the pointer is past the last row.
    fn fetch_assoc(&mut self) -> Option<Row>;

    /// Moves the native pointer to `row`. Returns false if the driver refused.
    fn data_seek(&mut self, row: usize) -> bool;

    /// Releases the native resources held by this result.
    fn free(&mut self) {}
}
