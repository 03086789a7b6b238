mod content;
mod extract;

pub use content::{EditorContent, PageContent, PageSnapshot, TextArea};
pub use extract::{
    detect_language, extract_code, extract_problem_details, find_anchor, first_non_empty,
    ProblemDetails, TITLE_SELECTORS,
};
