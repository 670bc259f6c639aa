// Cross-cutting prompt fragments sent with every completion call.
// Task-specific templates live next to the code that parses their output.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant \
    that writes job application emails. \
    You MUST respond with JSON only. \
    Do NOT include any text outside the JSON objects. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
