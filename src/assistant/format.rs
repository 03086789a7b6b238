use regex::Regex;
use std::sync::OnceLock;

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(\w*)\n?(.*?)```").expect("fenced block pattern"))
}

fn inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"))
}

fn bold() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern"))
}

fn italic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern"))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let with_code = inline_code().replace_all(&escaped, "<code>$1</code>");
    let with_bold = bold().replace_all(&with_code, "<strong>$1</strong>");
    let with_italic = italic().replace_all(&with_bold, "<em>$1</em>");
    with_italic.replace('\n', "<br>")
}

/// Render the small markdown subset the assistant produces as HTML.
///
/// Fenced blocks become `<pre><code>` with the language as a class; prose
/// gets inline code, bold, italics and line breaks. All text is escaped.
pub fn format_markdown(text: &str) -> String {
    let mut html = String::new();
    let mut last = 0;

    for caps in fenced_block().captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        html.push_str(&format_inline(&text[last..whole.start()]));

        let lang = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = escape_html(code.as_str().trim());
        if lang.is_empty() {
            html.push_str(&format!("<pre><code>{body}</code></pre>"));
        } else {
            html.push_str(&format!("<pre><code class=\"language-{lang}\">{body}</code></pre>"));
        }
        last = whole.end();
    }

    html.push_str(&format_inline(&text[last..]));
    html
}

/// Bodies of every fenced block, trimmed, in order of appearance.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    fenced_block()
        .captures_iter(text)
        .filter_map(|c| c.get(2))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
