//! Assemble the two-message review request for a model provider.
//!
//! The text lives in [`crate::prompts`]; this stage only decides the message
//! shape. Images are attached only when the target model is recognised as
//! vision-capable. Otherwise they are dropped rather than failing the request,
//! since text-only models reject image parts outright.

use crate::catalog::ChecklistItem;
use crate::config::ReviewConfig;
use crate::pipeline::encode::image_from_base64;
use crate::prompts::{review_system_prompt, review_user_text};
use edgequake_llm::ChatMessage;
use tracing::debug;

/// Build `[system, user]` messages for reviewing `text` against `checklist`.
pub fn build_review_messages(
    model: &str,
    text: &str,
    custom_instructions: &str,
    checklist: &[ChecklistItem],
    images: &[String],
    config: &ReviewConfig,
) -> Vec<ChatMessage> {
    let system = ChatMessage::system(review_system_prompt(checklist));
    let user_text = review_user_text(custom_instructions, text);

    let user = if images.is_empty() {
        ChatMessage::user(user_text)
    } else if config.supports_vision(model) {
        debug!("Attaching {} image(s) for vision model '{}'", images.len(), model);
        let parts = images.iter().map(|img| image_from_base64(img)).collect();
        ChatMessage::user_with_images(user_text, parts)
    } else {
        debug!(
            "Model '{}' is not vision-capable; dropping {} image(s)",
            model,
            images.len()
        );
        ChatMessage::user(user_text)
    };

    vec![system, user]
}
