/// Worker that handles message `seq` in a pool of `pool_size`.
///
/// Plain round robin in submission order. A zero-sized pool routes to 0.
pub fn worker_index(seq: u64, pool_size: usize) -> usize {
    if pool_size == 0 {
        return 0;
    }
    (seq % pool_size as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_order() {
        let routed: Vec<usize> = (0..9).map(|seq| worker_index(seq, 3)).collect();
        assert_eq!(routed, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_single_worker_and_empty_pool() {
        assert!((0..10).all(|seq| worker_index(seq, 1) == 0));
        assert_eq!(worker_index(7, 0), 0);
    }
}
