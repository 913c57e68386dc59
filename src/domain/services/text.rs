use regex::Regex;
use std::sync::OnceLock;

fn style_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("Invalid style block regex")
    })
}

fn script_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("Invalid script block regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"))
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("Invalid entity regex"))
}

/// Reduce an HTML document to its visible words separated by single spaces.
///
/// Style and script bodies are dropped, tags and entities become
/// whitespace, and runs of whitespace collapse.
pub fn strip_html(html: &str) -> String {
    let text = style_block_regex().replace_all(html, " ");
    let text = script_block_regex().replace_all(&text, " ");
    let text = tag_regex().replace_all(&text, " ");
    let text = entity_regex().replace_all(&text, " ");

    words(&text).join(" ")
}

/// Whitespace tokenization, locale agnostic
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
