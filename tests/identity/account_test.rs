// Account references

use custody::identity::{AccountId, AccountIdError, Keypair};
use std::collections::HashSet;

#[test]
fn test_account_display_prefix() {
    let account = Keypair::generate().account_id();
    assert!(account.to_string().starts_with("acct:"));
}

#[test]
fn test_account_parse_roundtrip() {
    let account = Keypair::generate().account_id();
    let parsed = AccountId::parse(&account.to_string()).unwrap();
    assert_eq!(parsed, account);
}

#[test]
fn test_distinct_keys_distinct_accounts() {
    let accounts: HashSet<AccountId> = (0..50).map(|_| Keypair::generate().account_id()).collect();
    assert_eq!(accounts.len(), 50);
}

#[test]
fn test_raw_bytes_account() {
    let account = AccountId::from_bytes([9; 32]);
    assert_eq!(account.as_bytes(), &[9; 32]);
    assert_eq!(AccountId::parse(&account.to_string()).unwrap(), account);
}

#[test]
fn test_parse_errors() {
    assert!(matches!(AccountId::parse(""), Err(AccountIdError::InvalidFormat(_))));
    assert!(matches!(AccountId::parse("acct:"), Err(AccountIdError::InvalidFormat(_))));
    assert!(matches!(AccountId::parse("acct:0OIl"), Err(AccountIdError::InvalidBase58(_))));
    assert!(matches!(AccountId::parse("acct:abc"), Err(AccountIdError::InvalidLength(_))));
}
