//! LLM response parsing into role-shaped generation output.
//!
//! The model is asked for a bare JSON object, but replies are often
//! wrapped in markdown fences or carry trailing commas. Parsing tries, in
//! order: the raw text, the first fenced block, and both again with
//! trailing commas removed.

use codeshop_types::{EmployeeRole, GeneratedFile, GenerationOutput, TaskDefinition};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::LlmError;

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(alias = "path", alias = "filename")]
    file_path: String,
    #[serde(alias = "code")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawCode {
    #[serde(default)]
    files: Vec<RawFile>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDesign {
    description: String,
    #[serde(default)]
    css: String,
}

#[derive(Debug, Deserialize)]
struct RawCopy {
    headline: String,
    #[serde(default)]
    body: String,
    #[serde(default, alias = "call_to_action")]
    cta: String,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    tasks: Vec<TaskDefinition>,
}

/// Parse `raw` into the output shape expected from `role`.
///
/// # Errors
///
/// Returns [`LlmError::Parse`] if no strategy yields a usable object, or
/// the object is empty (no files, no tasks, blank text).
pub fn parse_generation(raw: &str, role: EmployeeRole) -> Result<GenerationOutput, LlmError> {
    match role {
        EmployeeRole::Engineer => {
            let code: RawCode = parse_json(raw)?;
            let files: Vec<GeneratedFile> = code
                .files
                .into_iter()
                .filter(|f| !f.file_path.trim().is_empty())
                .map(|f| GeneratedFile {
                    file_path: f.file_path.trim().to_owned(),
                    content: f.content,
                })
                .collect();
            let combined = if files.is_empty() {
                code.code.unwrap_or_default()
            } else {
                files
                    .iter()
                    .map(|f| format!("// {}\n{}", f.file_path, f.content))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            if combined.trim().is_empty() {
                return Err(LlmError::Parse("engineer response has no code".to_owned()));
            }
            Ok(GenerationOutput::Code { files, combined })
        }
        EmployeeRole::Designer => {
            let design: RawDesign = parse_json(raw)?;
            if design.description.trim().is_empty() {
                return Err(LlmError::Parse("designer response has no description".to_owned()));
            }
            Ok(GenerationOutput::Design {
                description: design.description,
                css: design.css,
            })
        }
        EmployeeRole::Marketer => {
            let copy: RawCopy = parse_json(raw)?;
            if copy.headline.trim().is_empty() {
                return Err(LlmError::Parse("marketer response has no headline".to_owned()));
            }
            Ok(GenerationOutput::Copy {
                headline: copy.headline,
                body: copy.body,
                cta: copy.cta,
            })
        }
        EmployeeRole::Pm => {
            let plan: RawPlan = parse_json(raw)?;
            let tasks: Vec<TaskDefinition> = plan
                .tasks
                .into_iter()
                .filter(|t| !t.title.trim().is_empty())
                .collect();
            if tasks.is_empty() {
                return Err(LlmError::Parse("pm response has no tasks".to_owned()));
            }
            Ok(GenerationOutput::Plan { tasks })
        }
    }
}

/// Deserialize `raw` through the recovery strategies.
fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let trimmed = raw.trim();
    let fenced = extract_json_from_codeblock(trimmed);

    let mut candidates: Vec<String> = vec![trimmed.to_owned()];
    if let Some(inner) = fenced {
        candidates.push(inner.to_owned());
    }
    candidates.push(strip_trailing_commas(trimmed));
    if let Some(inner) = fenced {
        candidates.push(strip_trailing_commas(inner));
    }

    let mut last_error = None;
    for candidate in &candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    let reason = last_error.map_or_else(|| "empty response".to_owned(), |e| e.to_string());
    Err(LlmError::Parse(format!("all parse strategies failed: {reason}")))
}

/// The body of the first ```` ``` ```` fenced block, language tag skipped.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open.checked_add(3)?..)?;
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let close = body.find("```")?;
    body.get(..close).map(str::trim)
}

/// Drop commas that directly precede `}` or `]` (ignoring whitespace).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|next| !next.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}
