//! Placeholder substitution and pagination for offer templates.
//!
//! One regex walk serves all three output flavours; [`RenderMode`]
//! decides how a single placeholder and the page-break markers come out.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

/// Sentinel the preview surface splits pages on. Part of the output contract.
pub const PAGE_SPLIT_MARKER: &str = "<!--PAGE_SPLIT-->";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("Invalid placeholder regex"))
}

fn page_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<hr\b[^>]*page-break-before\s*:\s*always[^>]*>")
            .expect("Invalid page break regex")
    })
}

fn body_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</body\s*>").expect("Invalid body close regex"))
}

fn editor_placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<span\b[^>]*\bdata-var-key="([^"]*)"[^>]*>.*?</span\s*>"#)
            .expect("Invalid editor placeholder regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Interactive preview: addressable placeholder spans, split pages
    #[default]
    Preview,
    /// Plain substitution for the host's print engine, page breaks untouched
    Print,
    /// No substitution: every placeholder becomes a non-editable hole
    Editor,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Preview => "preview",
            RenderMode::Print => "print",
            RenderMode::Editor => "editor",
        }
    }

    fn render_placeholder(self, key: &str, variables: &HashMap<String, String>) -> String {
        let value = lookup(variables, key);
        let escaped_key = escape_html(key);

        match (self, value) {
            (RenderMode::Preview, Some(value)) => format!(
                r#"<span class="tpl-var tpl-var--filled" data-var-key="{}" data-var-state="filled">{}</span>"#,
                escaped_key,
                escape_value(value)
            ),
            (RenderMode::Preview, None) => format!(
                r#"<span class="tpl-var tpl-var--unfilled" data-var-key="{}" data-var-state="unfilled">{}</span>"#,
                escaped_key, escaped_key
            ),
            (RenderMode::Print, Some(value)) => escape_value(value),
            (RenderMode::Print, None) => escaped_key,
            (RenderMode::Editor, _) => format!(
                r#"<span class="tpl-var tpl-var--editor" contenteditable="false" data-var-key="{}">{{{{{}}}}}</span>"#,
                escaped_key, escaped_key
            ),
        }
    }

    fn paginate(self, html: String) -> String {
        match self {
            RenderMode::Preview => split_into_pages(html),
            RenderMode::Print | RenderMode::Editor => html,
        }
    }
}

/// Output of a full render with the facts the preview needs alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub total_pages: usize,
    pub unfilled_keys: Vec<String>,
}

/// Preview render: substitute variables and lay out pages.
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    render_with_mode(template, variables, RenderMode::Preview)
}

pub fn render_for_print(template: &str, variables: &HashMap<String, String>) -> String {
    render_with_mode(template, variables, RenderMode::Print)
}

pub fn render_for_editor(template: &str) -> String {
    render_with_mode(template, &HashMap::new(), RenderMode::Editor)
}

pub fn render_with_mode(
    template: &str,
    variables: &HashMap<String, String>,
    mode: RenderMode,
) -> String {
    let substituted = placeholder_regex().replace_all(template, |caps: &Captures| {
        let key = caps[1].trim();
        if key.is_empty() {
            caps[0].to_string()
        } else {
            mode.render_placeholder(key, variables)
        }
    });

    mode.paginate(substituted.into_owned())
}

pub fn render_document(
    template: &str,
    variables: &HashMap<String, String>,
    mode: RenderMode,
) -> RenderedDocument {
    RenderedDocument {
        html: render_with_mode(template, variables, mode),
        total_pages: count_pages(template),
        unfilled_keys: unfilled_keys(template, variables),
    }
}

/// Page-break markers plus one
pub fn count_pages(template: &str) -> usize {
    page_break_regex().find_iter(template).count() + 1
}

/// Split preview output into the HTML of each page.
pub fn split_pages(rendered: &str) -> Vec<&str> {
    rendered.split(PAGE_SPLIT_MARKER).collect()
}

/// Distinct placeholder keys in the template
pub fn extract_variable_keys(template: &str) -> BTreeSet<String> {
    placeholder_keys(template).map(str::to_string).collect()
}

/// Keys present in the template whose value is missing or empty, in order
/// of first appearance.
pub fn unfilled_keys(template: &str, variables: &HashMap<String, String>) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholder_keys(template)
        .filter(|key| lookup(variables, key).is_none())
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Turn editor placeholder spans back into `{{key}}` placeholders.
pub fn extract_template_from_editor(html: &str) -> String {
    editor_placeholder_regex()
        .replace_all(html, |caps: &Captures| {
            format!("{{{{{}}}}}", unescape_html(&caps[1]))
        })
        .into_owned()
}

/// Escape the five HTML special characters.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

fn escape_value(value: &str) -> String {
    escape_html(value).replace("\r\n", "\n").replace('\n', "<br>")
}

fn lookup<'a>(variables: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    variables
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn placeholder_keys(template: &str) -> impl Iterator<Item = &str> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|key| !key.is_empty())
}

fn page_footer(page: usize, total: usize) -> String {
    format!(r#"<div class="page-number">{} / {}</div>"#, page, total)
}

fn split_into_pages(html: String) -> String {
    let total = page_break_regex().find_iter(&html).count() + 1;
    if total == 1 {
        return html;
    }

    let mut page = 0;
    let mut paged = page_break_regex()
        .replace_all(&html, |_: &Captures| {
            page += 1;
            format!("{}{}", page_footer(page, total), PAGE_SPLIT_MARKER)
        })
        .into_owned();

    let last_footer = page_footer(total, total);
    match body_close_regex().find_iter(&paged).last().map(|m| m.start()) {
        Some(pos) => paged.insert_str(pos, &last_footer),
        None => paged.push_str(&last_footer),
    }
    paged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const BREAK: &str = r#"<hr style="page-break-before: always">"#;

    #[test]
    fn test_filled_placeholder_is_addressable() {
        let html = render("<p>{{x}}</p>", &vars(&[("x", "hello")]));
        assert_eq!(
            html,
            r#"<p><span class="tpl-var tpl-var--filled" data-var-key="x" data-var-state="filled">hello</span></p>"#
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let html = render("{{x}}", &vars(&[("x", "<b>&\"'")]));
        assert!(html.contains("&lt;b&gt;&amp;&quot;&#039;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_newlines_become_line_breaks() {
        let html = render_for_print("{{address}}", &vars(&[("address", "Gatvė 1\r\nVilnius\nLT")]));
        assert_eq!(html, "Gatvė 1<br>Vilnius<br>LT");
    }

    #[test]
    fn test_key_is_trimmed() {
        let html = render_for_print("Hi {{  name }}!", &vars(&[("name", "Ona")]));
        assert_eq!(html, "Hi Ona!");
    }

    #[test]
    fn test_missing_and_empty_values_render_unfilled() {
        let html = render("{{a}} {{b}}", &vars(&[("b", "")]));
        assert_eq!(html.matches(r#"data-var-state="unfilled""#).count(), 2);
        assert!(html.contains(r#"data-var-key="a""#));
        assert!(html.contains(r#"data-var-key="b""#));
        assert!(html.contains(">a</span>"));
    }

    #[test]
    fn test_malformed_placeholders_pass_through() {
        let template = "{x}} {{y} {{}} {{ }} {{a{b}}";
        let html = render(template, &vars(&[("x", "1"), ("y", "2")]));
        assert_eq!(html, template);
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = format!("<body>{{{{a}}}}{}{{{{b}}}}</body>", BREAK);
        let empty = HashMap::new();
        assert_eq!(render(&template, &empty), render(&template, &empty));
    }

    #[test]
    fn test_print_mode_keeps_page_breaks() {
        let template = format!("<body>{{{{a}}}}{}{{{{b}}}}</body>", BREAK);
        let html = render_for_print(&template, &vars(&[("a", "A")]));
        assert_eq!(html, format!("<body>A{}b</body>", BREAK));
        assert!(!html.contains(PAGE_SPLIT_MARKER));
    }

    #[test]
    fn test_editor_mode_skips_substitution() {
        let html = render_for_editor("<p>{{ client }}</p>");
        assert_eq!(
            html,
            r#"<p><span class="tpl-var tpl-var--editor" contenteditable="false" data-var-key="client">{{client}}</span></p>"#
        );
    }

    #[test]
    fn test_editor_output_extracts_back_to_template() {
        let template = format!("<body><p>{{{{client}}}} / {{{{date}}}}</p>{}</body>", BREAK);
        let editor_html = render_for_editor(&template);
        assert_eq!(extract_template_from_editor(&editor_html), template);
    }

    #[test]
    fn test_pagination_counts_and_footers() {
        let template = format!("<html><body>one{}two{}three</body></html>", BREAK, BREAK);
        assert_eq!(count_pages(&template), 3);

        let html = render(&template, &HashMap::new());
        assert!(html.contains(r#"<div class="page-number">1 / 3</div><!--PAGE_SPLIT-->"#));
        assert!(html.contains(r#"<div class="page-number">2 / 3</div><!--PAGE_SPLIT-->"#));
        assert!(html.ends_with(r#"three<div class="page-number">3 / 3</div></body></html>"#));
        assert!(!html.contains("<hr"));

        let pages = split_pages(&html);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].starts_with("two"));
    }

    #[test]
    fn test_single_page_has_no_footer() {
        let html = render("<body>{{a}}</body>", &HashMap::new());
        assert!(!html.contains("page-number"));
        assert!(!html.contains(PAGE_SPLIT_MARKER));
    }

    #[test]
    fn test_page_break_marker_is_whitespace_tolerant() {
        let template = r#"a<HR class="x" style="color:#000; page-break-before :  always;"/>b"#;
        assert_eq!(count_pages(template), 2);
        assert_eq!(count_pages(r#"a<hr style="page-break-after: always">b"#), 1);
    }

    #[test]
    fn test_footer_appended_without_body_tag() {
        let html = render(&format!("a{}b", BREAK), &HashMap::new());
        assert!(html.ends_with(r#"b<div class="page-number">2 / 2</div>"#));
    }

    #[test]
    fn test_unfilled_keys() {
        assert_eq!(unfilled_keys("{{a}}{{b}}", &vars(&[("a", "x")])), vec!["b"]);
        assert_eq!(
            unfilled_keys("{{b}} {{a}} {{b}} {{c}}", &vars(&[("c", "")])),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn test_extract_variable_keys() {
        let keys = extract_variable_keys("{{b}} {{ a }} {{b}} {x}");
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_render_document_bundles_metadata() {
        let template = format!("<body>{{{{a}}}}{}{{{{b}}}}</body>", BREAK);
        let doc = render_document(&template, &vars(&[("a", "1")]), RenderMode::Print);
        assert_eq!(doc.total_pages, 2);
        assert_eq!(doc.unfilled_keys, vec!["b"]);
        assert!(doc.html.contains(BREAK));
    }

    #[test]
    fn test_default_template_renders() {
        let template = crate::domain::entities::DEFAULT_TEMPLATE_HTML;
        assert_eq!(count_pages(template), 2);
        assert!(extract_variable_keys(template).contains("customer_name"));
        let html = render(template, &HashMap::new());
        assert_eq!(split_pages(&html).len(), 2);
    }
}
