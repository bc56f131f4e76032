use std::collections::{HashMap, HashSet};

use ammonia::Builder;

/// Tags allowed to survive in feed item content.
const ALLOWED_TAGS: [&str; 14] = [
    "a", "abbr", "acronym", "b", "blockquote", "code", "em", "i", "img", "li", "ol", "p", "strong",
    "ul",
];

/// Reduce listing HTML to a small allowlist of tags and attributes.
/// Disallowed elements are unwrapped so their text survives; script and
/// style blocks are removed along with their contents.
pub fn clean_content(html: &str) -> String {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title"].into_iter().collect());
    tag_attributes.insert("abbr", ["title"].into_iter().collect());
    tag_attributes.insert("acronym", ["title"].into_iter().collect());
    tag_attributes.insert("img", ["src"].into_iter().collect());

    Builder::default()
        .tags(ALLOWED_TAGS.into_iter().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .link_rel(None)
        .clean(html)
        .to_string()
}
