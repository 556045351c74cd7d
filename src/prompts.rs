// Prompt templates for the narrative agent

use crate::entities::stage::render_value;
use crate::entities::{CurrentVisa, StageInput};

pub const FINAL_STAGE_MESSAGE: &str =
    "You have reached the final stage of your immigration process.";

pub const EMPTY_EXPLANATION: &str = "Unable to generate explanation";

pub fn empty_next_steps(next_stage: &str) -> String {
    format!("Prepare for the {next_stage} stage.")
}

fn days(value: &Option<serde_json::Value>) -> String {
    render_value(value).map_or_else(|| "unknown".to_string(), |v| format!("{v} days"))
}

pub fn explanation_prompt(visa: &CurrentVisa, stage: &StageInput) -> String {
    let country = visa.country.as_deref().unwrap_or("Not specified");
    let notes = render_value(&stage.notes).unwrap_or_else(|| "None".to_string());

    format!(
        "You are an immigration expert. Analyze the following immigration status and provide a helpful explanation:

Current Visa Type: {visa_type}
Country: {country}
Visa Start Date: {start}
Visa Expiration Date: {expiration}
Current Status: {status}
Current Stage: {stage_name}
Average Duration for this Stage: {average}
Min Duration: {min}
Max Duration: {max}
Stage Notes: {notes}

Please provide:
1. A summary of the current immigration status
2. What typically happens at the {stage_name} stage
3. Key documents or steps that may be needed
4. Expected timeline for the next stage
5. Any important considerations or tips

Be concise and helpful.",
        visa_type = visa.visa_type,
        start = visa.start_date,
        expiration = visa.expiration_date,
        status = visa.status,
        stage_name = stage.stage_name,
        average = days(&stage.average_days),
        min = days(&stage.min_days),
        max = days(&stage.max_days),
    )
}

pub fn next_steps_prompt(current_stage: &str, next_stage: &str) -> String {
    format!(
        "You are an immigration expert. The user is currently at the {current_stage} stage and is preparing for the next stage: {next_stage}.

Please provide:
1. Key milestones to complete before moving to {next_stage}
2. Documents and evidence to prepare
3. Timeline expectations
4. Common pitfalls to avoid
5. Recommended action items

Be specific and practical."
    )
}
