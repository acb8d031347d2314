// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::skill_md::{
    parse_skill_md, render_skill_md, validate_skill_name, SkillMdError,
};

const BASIC: &str = "---\nname: pdf-tools\ndescription: Work with PDF files\n---\n\n# PDF Tools\n\nUse qpdf for splitting.\n";

#[test]
fn parses_basic_document() {
    let skill = parse_skill_md(BASIC).unwrap();
    assert_eq!(skill.name, "pdf-tools");
    assert_eq!(skill.description, "Work with PDF files");
    assert_eq!(skill.instructions, "# PDF Tools\n\nUse qpdf for splitting.");
    assert!(skill.license.is_none());
    assert!(skill.metadata.is_none());
}

#[test]
fn parses_optional_fields() {
    let text = "---\nname: research\ndescription: Deep research\nlicense: MIT\ncompatibility: claude\nallowed-tools: bash, web\nmetadata:\n  version: \"2\"\n  author: ops\n---\nBody here\n";
    let skill = parse_skill_md(text).unwrap();
    assert_eq!(skill.license.as_deref(), Some("MIT"));
    assert_eq!(skill.compatibility.as_deref(), Some("claude"));
    assert_eq!(skill.allowed_tools.as_deref(), Some("bash, web"));
    let metadata = skill.metadata.unwrap();
    assert_eq!(metadata.get("version").and_then(|v| v.as_str()), Some("2"));
    assert_eq!(skill.instructions, "Body here");
}

#[yare::parameterized(
    empty              = { "" },
    no_frontmatter     = { "just a markdown file\n" },
    unterminated       = { "---\nname: a\ndescription: b\n" },
    scalar_frontmatter = { "---\nhello\n---\nbody" },
)]
fn rejects_malformed_documents(text: &str) {
    assert!(parse_skill_md(text).is_err());
}

#[test]
fn missing_name_is_an_error() {
    let err = parse_skill_md("---\ndescription: d\n---\nbody").unwrap_err();
    assert!(matches!(err, SkillMdError::NameRequired));
}

#[test]
fn missing_description_is_an_error() {
    let err = parse_skill_md("---\nname: ok-name\n---\nbody").unwrap_err();
    assert!(matches!(err, SkillMdError::DescriptionRequired));
}

#[test]
fn overlong_description_is_an_error() {
    let text = format!("---\nname: ok\ndescription: {}\n---\nbody", "x".repeat(1025));
    assert!(matches!(parse_skill_md(&text).unwrap_err(), SkillMdError::DescriptionTooLong));
}

#[test]
fn metadata_must_be_a_mapping() {
    let err = parse_skill_md("---\nname: ok\ndescription: d\nmetadata: just-a-string\n---\nbody")
        .unwrap_err();
    assert!(matches!(err, SkillMdError::MetadataNotMapping));
}

#[yare::parameterized(
    simple          = { "pdf" },
    hyphenated      = { "pdf-tools" },
    digits          = { "tool2" },
    max_length      = { "abcdefghijklmnopqrstuvwxyz0123456789abcdefghijklmnopqrstuvwxyz01" },
)]
fn accepts_valid_names(name: &str) {
    assert!(validate_skill_name(name).is_ok());
}

#[yare::parameterized(
    uppercase        = { "My-Skill" },
    double_hyphen    = { "my--skill" },
    leading_hyphen   = { "-skill" },
    trailing_hyphen  = { "skill-" },
    underscore       = { "my_skill" },
    space            = { "my skill" },
    too_long         = { "abcdefghijklmnopqrstuvwxyz0123456789abcdefghijklmnopqrstuvwxyz012" },
)]
fn rejects_invalid_names(name: &str) {
    assert!(validate_skill_name(name).is_err());
}

#[test]
fn invalid_name_error_mentions_hyphen() {
    let err = parse_skill_md("---\nname: My--Skill\ndescription: d\n---\nbody").unwrap_err();
    assert!(err.to_string().contains("hyphen"), "got: {}", err);
}

#[test]
fn round_trip_is_idempotent() {
    let text = "---\nname: research\ndescription: Deep research\nlicense: Apache-2.0\nmetadata:\n  version: \"3\"\nallowed-tools: bash\n---\n\nDo the research carefully.\n";
    let once = parse_skill_md(text).unwrap();
    let rendered = render_skill_md(&once).unwrap();
    let twice = parse_skill_md(&rendered).unwrap();
    assert_eq!(once, twice);
}
