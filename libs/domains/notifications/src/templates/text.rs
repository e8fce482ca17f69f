//! Plain-text derivation of rendered HTML.

use regex::Regex;
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Entities the template escaper emits, plus the two the templates use directly.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
const ENTITIES: [(&str, &str); 9] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#x60;", "`"),
    ("&#x3D;", "="),
    ("&nbsp;", " "),
    ("&copy;", "©"),
    ("&amp;", "&"),
];

/// Strip `html` down to readable text: style blocks and tags removed,
/// common entities decoded, whitespace collapsed.
///
/// Lossy by nature; the HTML stays the source of truth.
pub fn strip_html(html: &str) -> String {
    let without_styles = STYLE_BLOCK.replace_all(html, "");
    let without_tags = replace_tags(&without_styles);
    let collapsed = WHITESPACE.replace_all(&without_tags, " ");

    let mut text = collapsed.trim().to_string();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    text
}

/// Tags become spaces so block elements don't glue words together, except
/// right before punctuation: `<b>World</b>!` reads `World!`. Text between
/// tags is copied untouched.
fn replace_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for tag in TAG.find_iter(html) {
        out.push_str(&html[last..tag.start()]);
        let next = html[tag.end()..].chars().next();
        if !matches!(next, Some('.' | ',' | '!' | '?' | ';' | ':' | ')')) {
            out.push(' ');
        }
        last = tag.end();
    }
    out.push_str(&html[last..]);
    out
}
