// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::job::SkillSelection;

#[test]
fn null_deserializes_to_all() {
    let sel: SkillSelection = serde_json::from_str("null").unwrap();
    assert_eq!(sel, SkillSelection::All);
}

#[test]
fn empty_list_deserializes_to_named_none() {
    let sel: SkillSelection = serde_json::from_str("[]").unwrap();
    assert_eq!(sel, SkillSelection::none());
}

#[test]
fn named_list_round_trips() {
    let sel: SkillSelection = serde_json::from_str(r#"["pdf-tools","research"]"#).unwrap();
    assert_eq!(
        sel,
        SkillSelection::Named(vec!["pdf-tools".to_string(), "research".to_string()])
    );
    assert_eq!(serde_json::to_string(&sel).unwrap(), r#"["pdf-tools","research"]"#);
}

#[test]
fn all_serializes_to_null() {
    assert_eq!(serde_json::to_string(&SkillSelection::All).unwrap(), "null");
}

#[test]
fn none_and_all_are_distinct() {
    assert_ne!(SkillSelection::none(), SkillSelection::All);
}
