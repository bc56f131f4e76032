use serde_json::{Map, Value};

/// Label the API repeats for free-text entries within a fold
const PARAGRAPH_LABEL: &str = "paragraph";

/// Flatten a fold, the API's ordered list of single-key objects, into one
/// map.
///
/// Repeated `paragraph` labels are disambiguated by position: the entry at
/// 0-based index `i` over the whole fold becomes `paragraph{i - 1}`, so the
/// usual belowFold layout `[header_1, header_2, paragraph]` exposes the
/// description as `paragraph1`. Downstream lookups depend on that exact
/// offset; do not "fix" it. Other repeated keys keep the last value seen.
/// Entries that are not single-key objects are ignored.
pub fn flatten_fold(entries: &[Value]) -> Map<String, Value> {
    let mut flattened = Map::new();

    for (index, entry) in entries.iter().enumerate() {
        let object = match entry.as_object() {
            Some(object) if object.len() == 1 => object,
            _ => continue,
        };
        let Some((label, value)) = object.iter().next() else {
            continue;
        };

        let key = if label == PARAGRAPH_LABEL {
            format!("{}{}", PARAGRAPH_LABEL, index as i64 - 1)
        } else {
            label.clone()
        };
        flattened.insert(key, value.clone());
    }

    flattened
}
