/// Progress callback receiving `(current, total)`.
///
/// Returning `false` requests cancellation at the next checkpoint.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Invoke an optional callback; `true` means keep going.
pub fn report(callback: Option<&ProgressCallback>, current: usize, total: usize) -> bool {
    match callback {
        Some(cb) => cb(current, total),
        None => true,
    }
}
