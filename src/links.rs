use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("url pattern compiles"));

/// Every http(s) URL in `text`, in order of appearance, duplicates included.
pub fn extract_links(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keep the links whose text contains `keyword`, ignoring case.
pub fn filter_links(links: &[String], keyword: &str) -> Vec<String> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return links.to_vec();
    }
    links
        .iter()
        .filter(|link| link.to_lowercase().contains(&keyword))
        .cloned()
        .collect()
}
