mod format;
mod gateway;
mod intent;
mod prompt;

pub use format::{escape_html, extract_code_blocks, format_markdown};
pub use gateway::{Assistant, GatewayError, GeminiGateway, GenerationConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
#[allow(unused_imports)]
pub use intent::{classify, Intent};
pub use prompt::{AttachEditorCode, PromptContext, PromptPipeline, DEFAULT_DESCRIPTION_LIMIT};
