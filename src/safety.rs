//! SAFE/UNSAFE gate for user-edited recipe content.

use serde::Serialize;
use tracing::{info, instrument};

use crate::llm::{LlmError, LlmProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyVerdict {
    Safe,
    Unsafe,
}

pub fn build_safety_prompt(text: &str) -> String {
    format!(
        "당신은 요리 레시피 검수자입니다. 아래 레시피가 사람이 먹거나 따라 하기에 안전한지 판단하세요.\n\
         독성 물질, 먹을 수 없는 재료, 위험한 조리법, 욕설이나 요리와 무관한 유해한 내용이 있으면 UNSAFE입니다.\n\
         다른 설명 없이 SAFE 또는 UNSAFE 중 한 단어로만 답하세요.\n\n\
         [레시피]\n{text}"
    )
}

/// Only a bare `SAFE` (surrounding punctuation ignored) is safe; any other
/// answer counts as UNSAFE.
pub fn parse_verdict(answer: &str) -> SafetyVerdict {
    let token = answer.trim().trim_matches(|c: char| !c.is_alphanumeric());
    if token.eq_ignore_ascii_case("SAFE") {
        SafetyVerdict::Safe
    } else {
        SafetyVerdict::Unsafe
    }
}

#[instrument(skip_all, fields(text_len = text.len()))]
pub async fn check_recipe_text(
    llm: &dyn LlmProvider,
    text: &str,
) -> Result<SafetyVerdict, LlmError> {
    let answer = llm.complete(&build_safety_prompt(text)).await?;
    let verdict = parse_verdict(&answer);
    info!(?verdict, "safety check");
    Ok(verdict)
}
