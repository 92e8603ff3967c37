//! Size-bounded partitioning of document collections.

use super::types::DocumentError;

/// Reject batch sizes that cannot partition anything.
pub fn validate_batch_size(batch_size: usize) -> Result<(), DocumentError> {
    if batch_size == 0 {
        return Err(DocumentError::Config("batch size must be greater than zero".into()));
    }
    Ok(())
}

/// Split `items` into ordered chunks of at most `batch_size` elements.
///
/// Batch `i` is `items[i * batch_size..(i + 1) * batch_size]`; an empty input yields no batches.
pub fn partition<T>(
    items: &[T],
    batch_size: usize,
) -> Result<std::slice::Chunks<'_, T>, DocumentError> {
    validate_batch_size(batch_size)?;
    Ok(items.chunks(batch_size))
}

/// Number of batches [`partition`] produces for `len` items.
pub fn expected_batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_count_matches_ceiling() {
        for len in [0usize, 1, 9, 10, 11, 99, 100, 101] {
            for size in [1usize, 3, 10, 100, 500] {
                let items: Vec<usize> = (0..len).collect();
                let batches: Vec<_> = partition(&items, size).expect("valid size").collect();
                let expected = expected_batch_count(len, size);
                assert_eq!(batches.len(), expected, "len={len} size={size}");
                assert_eq!(batches.concat(), items);
            }
        }
    }

    #[test]
    fn all_batches_but_last_are_full() {
        let items: Vec<u32> = (0..23).collect();
        let batches: Vec<&[u32]> = partition(&items, 5).expect("valid size").collect();
        assert_eq!(batches.len(), 5);
        assert!(batches[..4].iter().all(|batch| batch.len() == 5));
        assert_eq!(batches[4], &[20, 21, 22]);
    }

    #[test]
    fn zero_batch_size_is_config_error() {
        let items = [1, 2, 3];
        assert!(matches!(partition(&items, 0), Err(DocumentError::Config(_))));
        assert_eq!(expected_batch_count(3, 0), 0);
    }

    #[test]
    fn empty_input_has_no_batches() {
        let items: [u8; 0] = [];
        assert_eq!(partition(&items, 10).expect("valid size").count(), 0);
    }
}
