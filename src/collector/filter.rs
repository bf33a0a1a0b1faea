//! Section include/exclude filtering
//!
//! Works on section keys only, so it does not care which envelope the
//! section list arrived in.

use std::collections::BTreeMap;
use tracing::warn;

/// Select section keys to collect from.
///
/// A non-empty `include` restricts the result to those keys; entries the
/// server does not know are logged and skipped. `exclude` is applied last.
pub fn filter_sections<V>(
    sections: &BTreeMap<String, V>,
    include: &[String],
    exclude: &[String],
) -> Vec<String> {
    let selected: Vec<&String> = if include.is_empty() {
        sections.keys().collect()
    } else {
        include
            .iter()
            .filter(|key| {
                let known = sections.contains_key(key.as_str());
                if !known {
                    warn!(section = %key, "Requested section not found on server");
                }
                known
            })
            .collect()
    };

    let mut keys: Vec<String> = selected
        .into_iter()
        .filter(|key| !exclude.contains(key))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
