// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SKILL.md parsing: YAML frontmatter + markdown instruction body

use crate::JsonMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Structured contents of a SKILL.md document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSkill {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub license: Option<String>,
    pub compatibility: Option<String>,
    pub metadata: Option<JsonMap>,
    pub allowed_tools: Option<String>,
}

#[derive(Debug, Error)]
pub enum SkillMdError {
    #[error("SKILL.md is empty")]
    Empty,
    #[error("SKILL.md must start with YAML frontmatter delimited by ---")]
    MissingFrontmatter,
    #[error("invalid YAML frontmatter: {0}")]
    Yaml(String),
    #[error("YAML frontmatter must be a mapping")]
    NotMapping,
    #[error("'name' is required in frontmatter")]
    NameRequired,
    #[error("'name' must be 64 characters or fewer")]
    NameTooLong,
    #[error(
        "'name' must be lowercase alphanumeric with hyphens, \
         starting and ending with an alphanumeric"
    )]
    NameInvalid,
    #[error("'name' must not contain consecutive hyphens")]
    NameConsecutiveHyphens,
    #[error("'description' is required in frontmatter")]
    DescriptionRequired,
    #[error("'description' must be 1024 characters or fewer")]
    DescriptionTooLong,
    #[error("'metadata' must be a mapping if provided")]
    MetadataNotMapping,
}

/// Validate a skill name: 1–64 chars of lowercase alphanumerics and
/// hyphens, beginning and ending with an alphanumeric, no `--`.
pub fn validate_skill_name(name: &str) -> Result<(), SkillMdError> {
    if name.is_empty() {
        return Err(SkillMdError::NameRequired);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SkillMdError::NameTooLong);
    }
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid_chars = name.chars().all(|c| alnum(c) || c == '-');
    let valid_edges = name.starts_with(alnum) && name.ends_with(alnum);
    if !valid_chars || !valid_edges {
        return Err(SkillMdError::NameInvalid);
    }
    if name.contains("--") {
        return Err(SkillMdError::NameConsecutiveHyphens);
    }
    Ok(())
}

/// Parse a SKILL.md document into structured data.
///
/// The frontmatter sits between two lines containing exactly `---`;
/// everything after the closing delimiter becomes `instructions`
/// verbatim (trimmed).
pub fn parse_skill_md(content: &str) -> Result<ParsedSkill, SkillMdError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(SkillMdError::Empty);
    }

    let (frontmatter, body) = split_frontmatter(content)?;
    let doc: serde_yaml::Value =
        serde_yaml::from_str(frontmatter).map_err(|e| SkillMdError::Yaml(e.to_string()))?;
    let mapping = doc.as_mapping().ok_or(SkillMdError::NotMapping)?;

    let name = match string_field(mapping, "name") {
        Some(s) if !s.is_empty() => s,
        _ => return Err(SkillMdError::NameRequired),
    };
    validate_skill_name(&name)?;

    let description = match string_field(mapping, "description") {
        Some(s) if !s.is_empty() => s,
        _ => return Err(SkillMdError::DescriptionRequired),
    };
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(SkillMdError::DescriptionTooLong);
    }

    let metadata = match mapping.get("metadata") {
        None | Some(serde_yaml::Value::Null) => None,
        Some(value) => {
            let json: serde_json::Value = serde_yaml::from_value(value.clone())
                .map_err(|_| SkillMdError::MetadataNotMapping)?;
            match json {
                serde_json::Value::Object(map) => Some(map),
                _ => return Err(SkillMdError::MetadataNotMapping),
            }
        }
    };

    Ok(ParsedSkill {
        name,
        description,
        instructions: body.trim().to_string(),
        license: string_field(mapping, "license"),
        compatibility: string_field(mapping, "compatibility"),
        metadata,
        allowed_tools: string_field(mapping, "allowed-tools"),
    })
}

/// Render a parsed skill back to SKILL.md text.
///
/// Keys are emitted in a fixed order so parse → render → parse is
/// idempotent.
pub fn render_skill_md(skill: &ParsedSkill) -> Result<String, SkillMdError> {
    let mut mapping = serde_yaml::Mapping::new();
    let mut put = |key: &str, value: serde_yaml::Value| {
        mapping.insert(serde_yaml::Value::String(key.to_string()), value);
    };

    put("name", serde_yaml::Value::String(skill.name.clone()));
    put("description", serde_yaml::Value::String(skill.description.clone()));
    if let Some(license) = &skill.license {
        put("license", serde_yaml::Value::String(license.clone()));
    }
    if let Some(compat) = &skill.compatibility {
        put("compatibility", serde_yaml::Value::String(compat.clone()));
    }
    if let Some(metadata) = &skill.metadata {
        let value = serde_yaml::to_value(metadata).map_err(|e| SkillMdError::Yaml(e.to_string()))?;
        put("metadata", value);
    }
    if let Some(tools) = &skill.allowed_tools {
        put("allowed-tools", serde_yaml::Value::String(tools.clone()));
    }

    let frontmatter =
        serde_yaml::to_string(&mapping).map_err(|e| SkillMdError::Yaml(e.to_string()))?;
    Ok(format!("---\n{}---\n\n{}\n", frontmatter, skill.instructions))
}

fn split_frontmatter(content: &str) -> Result<(&str, &str), SkillMdError> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next().ok_or(SkillMdError::MissingFrontmatter)?;
    if first.trim() != "---" {
        return Err(SkillMdError::MissingFrontmatter);
    }

    let after_open = &content[first.len()..];
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim() == "---" {
            let frontmatter = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((frontmatter, body));
        }
        offset += line.len();
    }
    Err(SkillMdError::MissingFrontmatter)
}

fn string_field(mapping: &serde_yaml::Mapping, key: &str) -> Option<String> {
    match mapping.get(key)? {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "skill_md_tests.rs"]
mod tests;
