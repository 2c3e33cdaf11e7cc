// Resume analysis: prompt construction, model call, interpretation, batch ranking.
// All model calls go through llm_client::CompletionClient.

pub mod batch;
pub mod handlers;
pub mod interpreter;
pub mod prompts;

use crate::errors::AppError;
use crate::llm_client::{Completion, CompletionClient};
use interpreter::{interpret, Interpretation, SchemaPolicy};
use prompts::build_analysis_prompt;

/// Scores one resume against one job description.
///
/// Fails on an upstream error, or on a schema mismatch under `SchemaPolicy::Strict`.
/// Text that is not JSON is not an error: it comes back as the fallback object.
pub async fn analyze_resume(
    llm: &dyn CompletionClient,
    policy: SchemaPolicy,
    jd_text: &str,
    resume_text: &str,
) -> Result<(Completion, Interpretation), AppError> {
    let prompt = build_analysis_prompt(jd_text, resume_text);
    let completion = llm.complete(&prompt).await?;
    let interpretation = interpret(&completion.content).enforce(policy)?;
    Ok((completion, interpretation))
}
