use std::collections::HashSet;
use std::hash::Hash;

/// Removes repeats, keeping each element at the position of its first occurrence.
pub fn dedup<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

/// Share of `part` in `total` as a whole percentage, rounded half away from zero.
pub fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u64
}
