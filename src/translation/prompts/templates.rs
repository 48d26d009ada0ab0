/*!
 * Prompt templates for subtitle translation.
 *
 * Every backend receives the same system instruction ahead of the batch text,
 * either as a dedicated system field or prepended to the prompt.
 */

/// System prompt template for subtitle translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for subtitle batch translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"You are a translation assistant.
Your task is to translate the following {source_language} subtitles (in SRT format) into {target_language}.

• Preserve the original SRT structure (numbering, timecodes, blank lines).
• Only replace the {source_language} text with its {target_language} equivalent. Do not alter times or sequence numbers.
• Keep line breaks as in the original.
• Ensure proper {target_language} spelling and grammar.
• Keep each segment separated by "---" and maintain the same order.

Please output only the translated SRT content."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default subtitle translator template.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}
