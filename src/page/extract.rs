use super::content::PageContent;

/// Title candidates, most specific first.
pub const TITLE_SELECTORS: &[&str] = &[
    ".Header_resource_heading__cpRp1",
    ".question-title",
    "h1",
    ".title",
];

pub const DESCRIPTION_SELECTORS: &[&str] = &[".problem-statement", ".question-content", ".description"];

/// Elements the assistant button is placed after, in preference order.
pub const ANCHOR_SELECTORS: &[&str] = &[
    ".coding_ask_doubt_button__FjwXJ",
    ".question-fast-picker-wrapper",
    "h1",
    ".problem-statement",
    ".problem-description",
    ".question-content",
];

pub const EDITOR_SELECTORS: &[&str] = &[
    ".monaco-editor",
    ".CodeMirror",
    ".ace_editor",
    "pre.code-block",
    ".code-container",
    ".react-codemirror2",
    ".CodeMirror-code",
    "#code-editor",
    ".inputarea",
    ".source",
];

/// Per-line selectors for Monaco, CodeMirror and Ace.
const EDITOR_LINE_SELECTORS: &[&str] = &[".view-line", ".CodeMirror-line", ".ace_line"];

const LANGUAGE_PICKER_SELECTORS: &[&str] = &[
    ".language-select",
    ".language-picker",
    ".lang-select",
    "[data-cy=\"lang-select\"]",
    ".select-language",
];

pub const UNKNOWN_LANGUAGE: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemDetails {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// First selector whose trimmed text is non-empty.
pub fn first_non_empty(page: &dyn PageContent, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| page.text_of(s))
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

pub fn extract_problem_details(page: &dyn PageContent) -> ProblemDetails {
    ProblemDetails {
        title: first_non_empty(page, TITLE_SELECTORS).unwrap_or_default(),
        description: first_non_empty(page, DESCRIPTION_SELECTORS).unwrap_or_default(),
        url: page.url().to_string(),
    }
}

/// Whether the page has somewhere to anchor the assistant.
pub fn find_anchor(page: &dyn PageContent) -> Option<&'static str> {
    ANCHOR_SELECTORS
        .iter()
        .copied()
        .find(|s| page.text_of(s).is_some())
}

/// Pull the user's code out of whichever editor the page hosts.
pub fn extract_code(page: &dyn PageContent) -> Option<String> {
    for editor in EDITOR_SELECTORS {
        let Some(direct) = page.text_of(editor) else {
            continue;
        };

        for line_selector in EDITOR_LINE_SELECTORS {
            let lines = page.lines_within(editor, line_selector);
            if !lines.is_empty() {
                return Some(lines.join("\n").trim().to_string());
            }
        }

        if !direct.is_empty() {
            return Some(direct.trim().to_string());
        }
    }

    page.textareas()
        .into_iter()
        .filter(|t| !t.value.is_empty())
        .find(|t| {
            t.id.to_lowercase().contains("code")
                || t.class.to_lowercase().contains("code")
                || t.placeholder.to_lowercase().contains("code")
        })
        .map(|t| t.value.trim().to_string())
}

pub fn detect_language(page: &dyn PageContent) -> String {
    for selector in LANGUAGE_PICKER_SELECTORS {
        let Some(text) = page.text_of(selector) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        if let Some(lang) = language_from_picker(&text.to_lowercase()) {
            return lang.to_string();
        }
    }

    if let Some(lang) = language_from_url(&page.url().to_lowercase()) {
        return lang.to_string();
    }

    extract_code(page)
        .and_then(|code| language_from_code(&code))
        .unwrap_or(UNKNOWN_LANGUAGE)
        .to_string()
}

fn language_from_picker(text: &str) -> Option<&'static str> {
    if text.contains("python") {
        Some("python")
    } else if text.contains("java") && !text.contains("javascript") {
        Some("java")
    } else if text.contains("c++") {
        Some("cpp")
    } else if text.contains("javascript") || text.contains("js") {
        Some("javascript")
    } else if text.contains("ruby") {
        Some("ruby")
    } else if text.contains("go") {
        Some("go")
    } else {
        None
    }
}

fn language_from_url(url: &str) -> Option<&'static str> {
    if url.contains("python") {
        Some("python")
    } else if url.contains("java") && !url.contains("javascript") {
        Some("java")
    } else if url.contains("cpp") || url.contains("c++") {
        Some("cpp")
    } else if url.contains("javascript") || url.contains("js") {
        Some("javascript")
    } else {
        None
    }
}

fn language_from_code(code: &str) -> Option<&'static str> {
    if code.contains("def ") && code.contains(':') {
        Some("python")
    } else if code.contains("public class ") || code.contains("private class ") {
        Some("java")
    } else if code.contains("console.log") || code.contains("function ") {
        Some("javascript")
    } else if code.contains("#include") && (code.contains("cout") || code.contains("std::")) {
        Some("cpp")
    } else {
        None
    }
}
