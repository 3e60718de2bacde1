// Signed call envelopes and the ledger as a value transport

use custody::identity::Keypair;
use custody::ledger::{CallError, Ledger, LedgerError, SignedCall, WalletCall};
use custody::wallet::{TransferId, TransportError, ValueTransport, WalletId};

#[test]
fn test_caller_is_derived_from_signer() {
    let alice = Keypair::generate();
    let wallet = WalletId::from_bytes([4; 32]);
    let call = SignedCall::sign(&alice, &wallet, WalletCall::Deposit { amount: 10 }, 1);

    assert_eq!(call.caller(), alice.account_id());
    assert_eq!(call.signer(), &alice.public_key());
    assert_eq!(call.call(), &WalletCall::Deposit { amount: 10 });
}

#[test]
fn test_each_call_kind_verifies() {
    let kp = Keypair::generate();
    let wallet = WalletId::from_bytes([4; 32]);
    let to = Keypair::generate().account_id();
    let calls = [
        WalletCall::CreateTransfer { amount: 100, to },
        WalletCall::ApproveTransfer { id: TransferId::new(9) },
        WalletCall::Deposit { amount: 1 },
    ];

    for (nonce, call) in calls.into_iter().enumerate() {
        let signed = SignedCall::sign(&kp, &wallet, call, nonce as u64 + 1);
        let decoded = SignedCall::decode(&signed.encode()).unwrap();
        assert!(decoded.verify(&wallet));
    }
}

#[test]
fn test_distinct_calls_have_distinct_signatures() {
    let kp = Keypair::generate();
    let wallet = WalletId::from_bytes([4; 32]);
    let a = SignedCall::sign(&kp, &wallet, WalletCall::ApproveTransfer { id: TransferId::new(0) }, 1);
    let b = SignedCall::sign(&kp, &wallet, WalletCall::ApproveTransfer { id: TransferId::new(1) }, 1);

    assert_ne!(a.signature(), b.signature());
}

#[test]
fn test_same_call_on_other_wallet_signs_differently() {
    let kp = Keypair::generate();
    let call = WalletCall::Deposit { amount: 3 };
    let a = SignedCall::sign(&kp, &WalletId::from_bytes([4; 32]), call.clone(), 1);
    let b = SignedCall::sign(&kp, &WalletId::from_bytes([5; 32]), call, 1);

    assert_ne!(a.signature(), b.signature());
    assert!(!a.verify(&WalletId::from_bytes([5; 32])));
}

#[test]
fn test_decode_hex_errors() {
    assert!(matches!(
        SignedCall::decode_hex("zz"),
        Err(CallError::InvalidHex(_))
    ));
    assert!(matches!(
        SignedCall::decode_hex("00"),
        Err(CallError::DecodeError(_))
    ));
}

#[test]
fn test_ledger_credit_via_transport() {
    let mut ledger = Ledger::new();
    let to = Keypair::generate().account_id();

    ledger.send(&to, 40).unwrap();
    ledger.send(&to, 2).unwrap();

    assert_eq!(ledger.balance_of(&to), 42);
    assert_eq!(ledger.total_supply(), 42);
}

#[test]
fn test_ledger_unfreeze_restores_credits() {
    let mut ledger = Ledger::new();
    let to = Keypair::generate().account_id();
    ledger.freeze(to);

    assert!(matches!(ledger.credit(to, 1), Err(LedgerError::Frozen(_))));
    assert!(matches!(ledger.send(&to, 1), Err(TransportError::Rejected(_))));

    ledger.unfreeze(&to);
    assert!(!ledger.is_frozen(&to));
    assert_eq!(ledger.credit(to, 1).unwrap(), 1);
}
