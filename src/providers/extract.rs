// SPDX-License-Identifier: MIT

//! Hashtag and mention extraction from content text.

use regex::Regex;
use std::sync::LazyLock;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag regex"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention regex"));
// Facebook tagged-mention syntax: @[12345:username]
static TAGGED_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\[\d+:(\w+)\]").expect("tagged mention regex"));

/// All `#word` hashtags in order of appearance, `#` stripped.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// All simple `@word` mentions in order of appearance, `@` stripped.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Facebook-style `@[id:name]` tagged mentions, yielding the names.
pub fn extract_tagged_mentions(text: &str) -> Vec<String> {
    TAGGED_MENTION_RE
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}
