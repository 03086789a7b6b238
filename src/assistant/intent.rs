/// What the user is after, judged from the wording of the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CodeOnly,
    CodeCorrection,
    General,
}

const CODE_ONLY_PHRASES: &[&str] = &[
    "give me code",
    "provide code",
    "write code",
    "code for",
    "code to solve",
    "give code",
    "code solution",
    "show me code",
    "implement",
    "code only",
    "just the code",
    "code without explanation",
];

const EXPLANATION_PHRASES: &[&str] = &[
    "explain",
    "explanation",
    "why",
    "how",
    "understand",
    "describe",
    "clarify",
    "detailed",
    "step by step",
    "walk through",
    "break down",
];

const CORRECTION_TERMS: &[&str] = &[
    "fix",
    "correct",
    "debug",
    "improve",
    "optimize",
    "refactor",
    "what's wrong",
    "error",
    "not working",
    "doesn't work",
];

/// Wider net used to decide whether the user's editor code should be
/// attached to the question.
const CODE_HELP_TERMS: &[&str] = &[
    "fix",
    "correct",
    "debug",
    "improve",
    "optimize",
    "refactor",
    "solve",
    "what's wrong",
    "error",
    "not working",
    "doesn't work",
    "issue",
    "check my code",
    "review",
    "analyze",
    "help with code",
    "wrong output",
];

const CODE_FENCE: &str = "```";

const CODE_ONLY_SUFFIX: &str = "Please provide ONLY the code solution with no explanation. \
Return just the complete, working code in a code block. \
Do not include any commentary, explanation, or analysis before or after the code block.";

const CODE_CORRECTION_SUFFIX: &str = "As a coding assistant, please:
1. Analyze the code for bugs, inefficiencies, and style issues
2. Provide a clear explanation of any problems found
3. Offer a complete corrected version of the code, not just snippets
4. Explain the changes you made and why they improve the code

Format your response with:
- Analysis section explaining issues
- Complete corrected code in a code block
- Explanation of improvements";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn has_code_block(text: &str) -> bool {
    text.contains(CODE_FENCE)
}

pub fn classify(question: &str) -> Intent {
    let lower = question.to_lowercase();

    if contains_any(&lower, CODE_ONLY_PHRASES) && !contains_any(&lower, EXPLANATION_PHRASES) {
        Intent::CodeOnly
    } else if has_code_block(question) && contains_any(&lower, CORRECTION_TERMS) {
        Intent::CodeCorrection
    } else {
        Intent::General
    }
}

/// Whether the question asks for help with the user's own code.
pub fn wants_code_help(question: &str) -> bool {
    contains_any(&question.to_lowercase(), CODE_HELP_TERMS)
}

impl Intent {
    pub fn instruction_suffix(&self) -> Option<&'static str> {
        match self {
            Intent::CodeOnly => Some(CODE_ONLY_SUFFIX),
            Intent::CodeCorrection => Some(CODE_CORRECTION_SUFFIX),
            Intent::General => None,
        }
    }
}
