//! Context expansion of ranked matches.

/// Build the output text for every selected pool index.
///
/// Each result is the selected sentence followed by up to `window` directly
/// following pool sentences, joined by single spaces and cut off at the end
/// of the pool. Results keep the order of `selected`.
pub fn expand(pool: &[String], selected: &[usize], window: usize) -> Vec<String> {
    selected
        .iter()
        .filter_map(|&index| {
            let end = index.saturating_add(window).saturating_add(1).min(pool.len());
            pool.get(index..end)
                .filter(|sentences| !sentences.is_empty())
                .map(|sentences| sentences.join(" "))
        })
        .collect()
}
