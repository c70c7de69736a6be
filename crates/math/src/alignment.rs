use crate::is_power_of_2;

/// Rounds `offset` up to the next multiple of `alignment`.
///
/// The result is the smallest value `>= offset` that is divisible by `alignment`.
/// Calling it again on its own result returns the same value.
///
/// # Panics
///
/// Panics if `alignment` is not a power of two, or if the rounded offset
/// does not fit in a `u64`.
pub fn aligned_offset(offset: u64, alignment: u64) -> u64 {
    assert!(
        is_power_of_2(alignment),
        "alignment must be a power of two, got {alignment}"
    );
    let mask = alignment - 1;
    match offset.checked_add(mask) {
        Some(bumped) => bumped & !mask,
        None => panic!("offset {offset} overflows when aligned to {alignment}"),
    }
}
