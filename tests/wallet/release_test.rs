// Release is all-or-nothing: a failed release must not consume the vote

use custody::identity::{AccountId, Keypair};
use custody::ledger::Ledger;
use custody::wallet::{TransferStatus, TransportError, ValueTransport, Wallet, WalletError};

/// Transport that can be switched to reject, recording what it delivered
#[derive(Default)]
struct FlakyTransport {
    reject: bool,
    delivered: Vec<(AccountId, u64)>,
}

impl ValueTransport for FlakyTransport {
    fn send(&mut self, to: &AccountId, amount: u64) -> Result<(), TransportError> {
        if self.reject {
            return Err(TransportError::Unavailable("link down".into()));
        }
        self.delivered.push((*to, amount));
        Ok(())
    }
}

fn approvers(n: usize) -> Vec<AccountId> {
    (0..n).map(|_| Keypair::generate().account_id()).collect()
}

#[test]
fn test_transport_failure_leaves_transfer_pending() {
    let approvers = approvers(3);
    let to = Keypair::generate().account_id();
    let mut wallet = Wallet::with_balance(approvers.clone(), 2, 1000).unwrap();
    let mut transport = FlakyTransport::default();

    let id = wallet.create_transfer(&approvers[0], 100, to).unwrap();
    wallet.approve_transfer(&approvers[0], id, &mut transport).unwrap();

    transport.reject = true;
    let result = wallet.approve_transfer(&approvers[1], id, &mut transport);

    assert!(matches!(
        result,
        Err(WalletError::TransportFailed(TransportError::Unavailable(_)))
    ));
    let transfer = wallet.transfer(id).unwrap();
    assert_eq!(transfer.approvals(), 1);
    assert!(!transfer.is_sent());
    assert_eq!(transfer.status(), TransferStatus::PartiallyApproved);
    assert!(!wallet.has_approved(id, &approvers[1]));
    assert_eq!(wallet.balance(), 1000);
    assert!(transport.delivered.is_empty());
}

#[test]
fn test_same_approver_can_retry_after_transport_recovers() {
    let approvers = approvers(3);
    let to = Keypair::generate().account_id();
    let mut wallet = Wallet::with_balance(approvers.clone(), 2, 1000).unwrap();
    let mut transport = FlakyTransport::default();

    let id = wallet.create_transfer(&approvers[0], 100, to).unwrap();
    wallet.approve_transfer(&approvers[0], id, &mut transport).unwrap();

    transport.reject = true;
    assert!(wallet.approve_transfer(&approvers[1], id, &mut transport).is_err());

    transport.reject = false;
    let outcome = wallet.approve_transfer(&approvers[1], id, &mut transport).unwrap();

    assert!(outcome.is_released());
    assert_eq!(transport.delivered, vec![(to, 100)]);
    assert_eq!(wallet.balance(), 900);
}

#[test]
fn test_insufficient_funds_at_release() {
    let approvers = approvers(2);
    let to = Keypair::generate().account_id();
    let mut wallet = Wallet::with_balance(approvers.clone(), 2, 50).unwrap();
    let mut ledger = Ledger::new();

    let id = wallet.create_transfer(&approvers[0], 100, to).unwrap();
    wallet.approve_transfer(&approvers[0], id, &mut ledger).unwrap();
    let result = wallet.approve_transfer(&approvers[1], id, &mut ledger);

    assert_eq!(
        result,
        Err(WalletError::InsufficientFunds {
            available: 50,
            required: 100
        })
    );
    assert_eq!(wallet.transfer(id).unwrap().approvals(), 1);
    assert_eq!(ledger.balance_of(&to), 0);

    // topping up the pool lets the pending vote go through
    wallet.deposit(50).unwrap();
    assert!(wallet.approve_transfer(&approvers[1], id, &mut ledger).unwrap().is_released());
    assert_eq!(ledger.balance_of(&to), 100);
    assert_eq!(wallet.balance(), 0);
}

#[test]
fn test_frozen_recipient_rejects_release() {
    let approvers = approvers(1);
    let to = Keypair::generate().account_id();
    let mut wallet = Wallet::with_balance(approvers.clone(), 1, 10).unwrap();
    let mut ledger = Ledger::new();
    ledger.freeze(to);

    let id = wallet.create_transfer(&approvers[0], 10, to).unwrap();
    let result = wallet.approve_transfer(&approvers[0], id, &mut ledger);

    assert!(matches!(
        result,
        Err(WalletError::TransportFailed(TransportError::Rejected(_)))
    ));
    assert_eq!(wallet.transfer(id).unwrap().status(), TransferStatus::Created);
    assert_eq!(wallet.balance(), 10);
}

#[test]
fn test_no_double_send() {
    let approvers = approvers(3);
    let to = Keypair::generate().account_id();
    let mut wallet = Wallet::with_balance(approvers.clone(), 1, 1000).unwrap();
    let mut transport = FlakyTransport::default();

    let id = wallet.create_transfer(&approvers[0], 100, to).unwrap();
    for approver in &approvers {
        let _ = wallet.approve_transfer(approver, id, &mut transport);
    }

    assert_eq!(transport.delivered, vec![(to, 100)]);
    assert_eq!(wallet.balance(), 900);
}
