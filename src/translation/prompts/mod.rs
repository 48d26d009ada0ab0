/*!
 * Prompt construction for subtitle translation.
 */

pub mod templates;

pub use templates::PromptTemplate;
