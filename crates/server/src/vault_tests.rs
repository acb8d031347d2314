// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::vault::{Vault, VaultError};

#[test]
fn seal_open_round_trips() {
    let vault = Vault::new("test-master-key");
    let sealed = vault.seal("ghp_secret_token").unwrap();
    assert_ne!(sealed, "ghp_secret_token");
    assert_eq!(vault.open(&sealed).unwrap(), "ghp_secret_token");
}

#[test]
fn seal_is_randomised_per_call() {
    let vault = Vault::new("test-master-key");
    let a = vault.seal("same value").unwrap();
    let b = vault.seal("same value").unwrap();
    assert_ne!(a, b, "nonces must differ");
    assert_eq!(vault.open(&a).unwrap(), vault.open(&b).unwrap());
}

#[test]
fn wrong_key_fails_to_open() {
    let sealed = Vault::new("key-one").seal("value").unwrap();
    assert!(matches!(Vault::new("key-two").open(&sealed), Err(VaultError::Decrypt)));
}

#[test]
fn unconfigured_vault_refuses_both_directions() {
    let vault = Vault::new("");
    assert!(matches!(vault.seal("x"), Err(VaultError::MissingKey)));
    assert!(matches!(vault.open("eA=="), Err(VaultError::MissingKey)));
}

#[yare::parameterized(
    not_base64 = { "not base64 !!!" },
    truncated  = { "eA==" },
)]
fn malformed_tokens_are_rejected(token: &str) {
    let vault = Vault::new("key");
    assert!(vault.open(token).is_err());
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let vault = Vault::new("key");
    let sealed = vault.seal("value").unwrap();
    let mut bytes = sealed.into_bytes();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();
    assert!(vault.open(&tampered).is_err());
}
