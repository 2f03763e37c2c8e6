//! End-to-end integration tests for algotx.
//!
//! These tests walk whole client-side flows through the public API only:
//! build a transaction, sign it one of the three ways, group it, pass a
//! multisig envelope between co-signers, delegate through a logic
//! signature, and decode whatever came out. They prove the pieces compose;
//! the per-module unit tests cover the edge cases.
//!
//! Each test builds its own accounts and parameters. No shared state.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use algotx_protocol::crypto::{verify_bytes, Account};
use algotx_protocol::encoding::{decode_json, encode_json, encode_msgpack};
use algotx_protocol::logicsig::{
    sign_logic_sig_transaction, sign_logic_sig_transaction_object,
    sign_logic_sig_transaction_with_address, LogicSig, LogicSigAccount,
};
use algotx_protocol::multisig::{
    append_sign_multisig_transaction, create_multisig_transaction, merge_multisig_transactions,
    sign_multisig_transaction, verify_multisig, MultisigMetadata,
};
use algotx_protocol::transaction::{
    assign_group_id, compute_group_id, decode_signed_transaction, decode_unsigned_transaction,
    encode_unsigned_simulate_transaction, encode_unsigned_transaction, sign_transaction,
    SuggestedParams, Transaction, TransactionBuilder, TransactionType,
};
use algotx_protocol::{Address, Error};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// One signed multisig payment: 2-of-3, only the first member has signed.
const GOLDEN_MULTISIG_BLOB: &str = "gqRtc2lng6ZzdWJzaWeTgqJwa8QgG37AsEvqYbeWkJfmy/QH4QinBTUdC8mKvrEiCairgXihc8RAuLAFE0oma0skOoAmOzEwfPuLYpEWl4LINtsiLrUqWQkDxh4WHb29//YCpj4MFbiSgD2jKYt0XKRD86zKCF4RDYGicGvEIAljMglTc4nwdWcRdzmRx9A+G3PIxPUr9q/wGqJc+cJxgaJwa8Qg5/D4TQaBHfnzHI2HixFV9GcdUaGFwgCQhmf0SVhwaKGjdGhyAqF2AaN0eG6Lo2FtdM0D6KVjbG9zZcQgQOk0koglZMvOnFmmm2dUJonpocOiqepbZabopEIf/FejZmVlzQPoomZ2zfMVo2dlbqxkZXZuZXQtdjM4LjCiZ2jEIP6zbDkQFDkAw9pVQsoYNrAP0vgZWRJXzSP2BC+YyDadomx2zfb9pG5vdGXECEUmIgAYUob7o3JjdsQge2ziT+tbrMCxZOKcIixX9fY9w4fUOQSCWEEcX+EPfAKjc25kxCCNkrSJkAFzoE36Q1mjZmpq/OosQqBd2cH3PuulR4A36aR0eXBlo3BheQ==";

/// `#pragma version 1; int 1` assembled.
const TRUE_PROGRAM: [u8; 5] = [1, 32, 1, 1, 34];

fn params() -> SuggestedParams {
    SuggestedParams {
        flat_fee: false,
        fee: 0,
        min_fee: 1000,
        first_valid: 1000,
        last_valid: 2000,
        genesis_id: "testnet-v1.0".into(),
        genesis_hash: [7u8; 32],
    }
}

fn payment(sender: Address, receiver: Address, amount: u64) -> Transaction {
    TransactionBuilder::payment(sender, receiver, amount, &params())
        .build()
        .expect("valid payment")
}

fn accounts(n: usize) -> Vec<Account> {
    (0..n).map(|_| Account::generate()).collect()
}

// ---------------------------------------------------------------------------
// Single-signature flow
// ---------------------------------------------------------------------------

#[test]
fn payment_build_sign_decode() {
    let alice = Account::generate();
    let bob = Account::generate();
    let txn = TransactionBuilder::payment(alice.address(), bob.address(), 1_234_567, &params())
        .note(b"rent".to_vec())
        .build()
        .unwrap();

    assert_eq!(txn.tx_type(), TransactionType::Payment);
    assert_eq!(txn.fee(), 1000);

    // Unsigned form survives a round trip byte for byte.
    let unsigned = encode_unsigned_transaction(&txn).unwrap();
    let back = decode_unsigned_transaction(&unsigned).unwrap();
    assert_eq!(back, txn);
    assert_eq!(encode_unsigned_transaction(&back).unwrap(), unsigned);

    let signed = sign_transaction(&txn, &alice).unwrap();
    assert_eq!(signed.tx_id, txn.tx_id().unwrap());

    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(envelope.txn, txn);
    assert!(envelope.sgnr.is_none());
    let sig = envelope.sig.expect("single signature");
    assert!(verify_bytes(
        &alice.public_key(),
        &txn.bytes_to_sign().unwrap(),
        &sig
    ));
}

#[test]
fn rekeyed_signer_is_recorded() {
    let owner = Account::generate();
    let delegate = Account::generate();
    let txn = payment(owner.address(), owner.address(), 0);

    let envelope = decode_signed_transaction(&txn.sign(&delegate).unwrap()).unwrap();
    assert_eq!(envelope.sgnr, Some(delegate.address()));
    assert_eq!(envelope.tx_id().unwrap(), txn.tx_id().unwrap());
}

#[test]
fn json_and_simulate_forms() {
    let a = Account::generate();
    let txn = TransactionBuilder::asset_transfer(a.address(), a.address(), 31566704, 0, &params())
        .build()
        .unwrap();

    let json = encode_json(&txn).unwrap();
    assert!(json.contains("\"axfer\""));
    let back: Transaction = decode_json(&json).unwrap();
    assert_eq!(back, txn);

    let simulate = decode_signed_transaction(&encode_unsigned_simulate_transaction(&txn).unwrap())
        .unwrap();
    assert_eq!(simulate.txn, txn);
    assert!(simulate.sig.is_none() && simulate.msig.is_none() && simulate.lsig.is_none());
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[test]
fn atomic_group_sign_each() {
    let people = accounts(3);
    let txns: Vec<Transaction> = people
        .iter()
        .enumerate()
        .map(|(i, acct)| payment(acct.address(), people[(i + 1) % 3].address(), 100 + i as u64))
        .collect();

    let gid = compute_group_id(&txns).unwrap();
    let grouped = assign_group_id(&txns, None).unwrap();
    assert_eq!(grouped.len(), 3);

    for (txn, acct) in grouped.iter().zip(&people) {
        assert_eq!(txn.group(), Some(&gid));
        let envelope = decode_signed_transaction(&txn.sign(acct).unwrap()).unwrap();
        assert_eq!(envelope.txn.group(), Some(&gid));
    }

    // The group id changes the transaction id.
    assert_ne!(grouped[0].tx_id().unwrap(), txns[0].tx_id().unwrap());

    // Filtering by sender returns only that sender's members, still grouped.
    let mine = assign_group_id(&txns, Some(people[1].address())).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].sender(), people[1].address());
    assert_eq!(mine[0].group(), Some(&gid));
}

#[test]
fn group_limits() {
    let a = Account::generate();
    assert!(matches!(assign_group_id(&[], None), Err(Error::Validation(_))));

    let many: Vec<Transaction> = (0..17).map(|i| payment(a.address(), a.address(), i)).collect();
    assert!(matches!(compute_group_id(&many), Err(Error::Validation(_))));
    assert!(compute_group_id(&many[..16]).is_ok());
}

// ---------------------------------------------------------------------------
// Multisig
// ---------------------------------------------------------------------------

#[test]
fn multisig_pass_around_and_merge() {
    let members = accounts(3);
    let metadata =
        MultisigMetadata::new(1, 2, members.iter().map(|m| m.address()).collect()).unwrap();
    let msig_addr = metadata.address().unwrap();
    let txn = payment(msig_addr, members[0].address(), 5_000);

    // Route one: start from an empty envelope and append in turn.
    let empty = create_multisig_transaction(&txn, &metadata).unwrap();
    let first = append_sign_multisig_transaction(&empty, &metadata, &members[0]).unwrap();
    let second = append_sign_multisig_transaction(&first.blob, &metadata, &members[2]).unwrap();
    assert_eq!(second.tx_id, txn.tx_id().unwrap());

    // Route two: sign independently and merge.
    let a = sign_multisig_transaction(&txn, &metadata, &members[0]).unwrap();
    let c = sign_multisig_transaction(&txn, &metadata, &members[2]).unwrap();
    let merged = merge_multisig_transactions(&[&a.blob, &c.blob]).unwrap();

    assert_eq!(merged, second.blob);

    let envelope = decode_signed_transaction(&merged).unwrap();
    assert!(envelope.sgnr.is_none());
    let msig = envelope.msig.expect("multisig");
    assert_eq!(msig.signature_count(), 2);
    assert!(verify_multisig(&txn.bytes_to_sign().unwrap(), &msig, &msig_addr));

    // One signature is below threshold.
    let partial = decode_signed_transaction(&a.blob).unwrap().msig.unwrap();
    assert!(!verify_multisig(&txn.bytes_to_sign().unwrap(), &partial, &msig_addr));
}

#[test]
fn multisig_merge_rejects_mismatch() {
    let members = accounts(2);
    let metadata =
        MultisigMetadata::new(1, 2, members.iter().map(|m| m.address()).collect()).unwrap();
    let msig_addr = metadata.address().unwrap();

    let one = sign_multisig_transaction(&payment(msig_addr, msig_addr, 1), &metadata, &members[0])
        .unwrap();
    let two = sign_multisig_transaction(&payment(msig_addr, msig_addr, 2), &metadata, &members[1])
        .unwrap();
    assert!(matches!(
        merge_multisig_transactions(&[&one.blob, &two.blob]),
        Err(Error::StructuralMismatch(_))
    ));
    assert!(matches!(
        merge_multisig_transactions(&[&one.blob]),
        Err(Error::Validation(_))
    ));

    let outsider = Account::generate();
    assert!(matches!(
        sign_multisig_transaction(&payment(msig_addr, msig_addr, 1), &metadata, &outsider),
        Err(Error::CryptoVerification(_))
    ));
}

#[test]
fn multisig_for_rekeyed_sender_sets_signer() {
    let members = accounts(2);
    let metadata =
        MultisigMetadata::new(1, 1, members.iter().map(|m| m.address()).collect()).unwrap();
    let owner = Account::generate();
    let txn = payment(owner.address(), owner.address(), 0);

    let signed = sign_multisig_transaction(&txn, &metadata, &members[1]).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(envelope.sgnr, Some(metadata.address().unwrap()));
}

#[test]
fn golden_multisig_blob() {
    let blob = STANDARD.decode(GOLDEN_MULTISIG_BLOB).unwrap();
    let envelope = decode_signed_transaction(&blob).unwrap();

    assert_eq!(
        envelope.tx_id().unwrap(),
        "MANN3ESOHQVHFZBAGD6UK6XFVWEFZQJPWO5SQ2J5LZRCF5E2VVQQ"
    );
    assert_eq!(envelope.txn.tx_type(), TransactionType::Payment);
    assert_eq!(envelope.txn.genesis_id(), "devnet-v38.0");
    assert!(envelope.sgnr.is_none());

    let msig = envelope.msig.clone().expect("multisig");
    let msig_addr = msig.address().unwrap();
    assert_eq!(msig_addr, envelope.txn.sender());
    assert_eq!(
        msig_addr.to_string(),
        "RWJLJCMQAFZ2ATP2INM2GZTKNL6OULCCUBO5TQPXH3V2KR4AG7U5UA5JNM"
    );
    assert_eq!(msig.threshold, 2);
    assert_eq!(msig.signature_count(), 1);

    let message = envelope.txn.bytes_to_sign().unwrap();
    let first = &msig.subsigs[0];
    assert!(verify_bytes(
        &first.public_key,
        &message,
        first.signature.as_ref().unwrap()
    ));
    assert!(!verify_multisig(&message, &msig, &msig_addr));

    // Re-encoding reproduces the exact bytes.
    assert_eq!(encode_msgpack(&envelope).unwrap(), blob);
}

// ---------------------------------------------------------------------------
// Logic signatures
// ---------------------------------------------------------------------------

#[test]
fn delegated_logic_sig_flow() {
    let owner = Account::generate();
    let mut account = LogicSigAccount::new(TRUE_PROGRAM.to_vec(), vec![b"arg".to_vec()]).unwrap();
    assert!(!account.is_delegated());
    account.sign(&owner).unwrap();
    assert!(account.is_delegated());
    assert_eq!(account.address().unwrap(), owner.address());

    let txn = payment(owner.address(), Account::generate().address(), 10);
    let signed = sign_logic_sig_transaction(&txn, &account).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();

    assert!(envelope.sgnr.is_none());
    let lsig = envelope.lsig.expect("logic signature");
    assert_eq!(lsig.args(), &[b"arg".to_vec()]);
    assert!(lsig.verify(&owner.address()));

    // An account rekeyed to the owner can spend through the same
    // delegation; the envelope names the owner as signer.
    let rekeyed = Account::generate();
    let other = payment(rekeyed.address(), rekeyed.address(), 1);
    let signed = sign_logic_sig_transaction(&other, &account).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(envelope.sgnr, Some(owner.address()));
}

#[test]
fn bare_delegated_logic_sig_acts_for_sender() {
    let owner = Account::generate();
    let mut delegation = LogicSig::new(TRUE_PROGRAM.to_vec(), vec![]).unwrap();
    delegation.sign(&owner).unwrap();

    // Hand the delegation around inside an envelope, then reuse the decoded
    // copy without knowing who signed it.
    let first = payment(owner.address(), Account::generate().address(), 10);
    let signed = sign_logic_sig_transaction_object(&first, &delegation).unwrap();
    let lsig = decode_signed_transaction(&signed.blob)
        .unwrap()
        .lsig
        .expect("logic signature");
    assert_eq!(lsig, delegation);

    let second = payment(owner.address(), Account::generate().address(), 20);
    let signed = sign_logic_sig_transaction_object(&second, &lsig).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(signed.tx_id, second.tx_id().unwrap());
    assert!(envelope.sgnr.is_none());
    assert!(envelope.lsig.unwrap().verify(&owner.address()));

    // Someone else's payment does not match the delegator's signature.
    let stranger = Account::generate();
    let foreign = payment(stranger.address(), stranger.address(), 1);
    assert!(matches!(
        sign_logic_sig_transaction_object(&foreign, &lsig),
        Err(Error::CryptoVerification(_))
    ));

    // Without any signature the program acts for its own address.
    let escrow = LogicSig::new(TRUE_PROGRAM.to_vec(), vec![]).unwrap();
    let rekeyed = payment(stranger.address(), stranger.address(), 1);
    let signed = sign_logic_sig_transaction_object(&rekeyed, &escrow).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(envelope.sgnr, Some(escrow.address()));
}

#[test]
fn multisig_delegated_logic_sig_flow() {
    let members = accounts(3);
    let metadata =
        MultisigMetadata::new(1, 2, members.iter().map(|m| m.address()).collect()).unwrap();
    let msig_addr = metadata.address().unwrap();

    let mut account = LogicSigAccount::new(TRUE_PROGRAM.to_vec(), vec![]).unwrap();
    account.sign_multisig(&metadata, &members[0]).unwrap();
    assert!(!account.verify());
    account.append_to_multisig(&members[1]).unwrap();
    assert!(account.verify());
    assert_eq!(account.address().unwrap(), msig_addr);

    let txn = payment(msig_addr, members[2].address(), 77);
    let signed = sign_logic_sig_transaction(&txn, &account).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert!(envelope.lsig.unwrap().verify(&msig_addr));

    // The bare logic signature resolves the same multisig authorizer.
    let bare = sign_logic_sig_transaction_object(&txn, account.lsig()).unwrap();
    assert_eq!(bare.blob, signed.blob);
}

#[test]
fn escrow_logic_sig_flow() {
    let escrow = LogicSig::new(TRUE_PROGRAM.to_vec(), vec![]).unwrap();
    let escrow_addr = escrow.address();
    assert_eq!(
        escrow_addr.to_string(),
        "6Z3C3LDVWGMX23BMSYMANACQOSINPFIRF77H7N3AWJZYV6OH6GWTJKVMXY"
    );

    let txn = payment(escrow_addr, Account::generate().address(), 1);
    let signed = sign_logic_sig_transaction_with_address(&txn, &escrow, &escrow_addr).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert!(envelope.sgnr.is_none());
    assert!(envelope.lsig.unwrap().verify(&escrow_addr));

    // An account rekeyed to the program records the program as signer.
    let rekeyed = Account::generate();
    let txn = payment(rekeyed.address(), rekeyed.address(), 1);
    let signed = sign_logic_sig_transaction_with_address(&txn, &escrow, &escrow_addr).unwrap();
    let envelope = decode_signed_transaction(&signed.blob).unwrap();
    assert_eq!(envelope.sgnr, Some(escrow_addr));

    // The program does not verify for an unrelated address.
    assert!(matches!(
        sign_logic_sig_transaction_with_address(&txn, &escrow, &rekeyed.address()),
        Err(Error::CryptoVerification(_))
    ));
}
