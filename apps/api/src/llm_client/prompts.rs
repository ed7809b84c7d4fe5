// Shared prompt fragments. Each capability that calls the reasoning service
// defines its own prompts alongside it (see gateway::prompts).

/// System prompt fragment that enforces raw JSON output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with ONLY raw JSON. \
    Do NOT wrap the JSON in ```json``` or any other Markdown formatting. \
    Do NOT add any explanation text before or after the JSON.";

/// Instruction that keeps rewrites inside the facts the candidate supplied.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only rephrase information explicitly provided. \
    Do NOT introduce new skills, roles, companies, or accomplishments.";
