//! Ordering helpers for pickers

/// Put recently used items first
///
/// Items whose key appears in `recent` come first, in the order of `recent`.
/// The remaining items keep their original relative order.
pub fn sort_by_recency<T, K, F>(items: Vec<T>, recent: &[K], key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut ranked: Vec<(usize, T)> = items
        .into_iter()
        .map(|item| {
            let k = key(&item);
            let rank = recent.iter().position(|r| *r == k).unwrap_or(recent.len());
            (rank, item)
        })
        .collect();
    // Stable sort keeps original order among equal ranks
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
    }

    fn items(ids: &[&'static str]) -> Vec<Item> {
        ids.iter().map(|id| Item { id }).collect()
    }

    #[test]
    fn test_recent_first_in_recent_order() {
        let sorted = sort_by_recency(items(&["a", "b", "c"]), &["b", "c"], |i| i.id);
        assert_eq!(sorted, items(&["b", "c", "a"]));

        let sorted = sort_by_recency(items(&["a", "b", "c", "d"]), &["d", "b"], |i| i.id);
        assert_eq!(sorted, items(&["d", "b", "a", "c"]));
    }

    #[test]
    fn test_unknown_recent_keys_are_ignored() {
        let sorted = sort_by_recency(items(&["a", "b"]), &["z"], |i| i.id);
        assert_eq!(sorted, items(&["a", "b"]));
    }

    #[test]
    fn test_empty_recent_keeps_order() {
        let sorted = sort_by_recency(items(&["c", "a", "b"]), &[], |i| i.id);
        assert_eq!(sorted, items(&["c", "a", "b"]));
    }
}
