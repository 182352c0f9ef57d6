//! End-to-end pool flows: shield, scan, transfer, unshield
//!
//! Each test drives the state machine through the wallet-side builders and
//! checks ledger, bank and event effects together.

#[cfg(test)]
mod tests {
    use crate::crypto::commitments::verify_multi_balance;
    use crate::crypto::{PedersenCommitment, StealthKeyPair};
    use crate::database::{DBConfig, DatabaseManager, KvStore, MemoryStore};
    use crate::privacy::client::{build_private_transfer, build_shield, build_unshield};
    use crate::privacy::events::event_types;
    use crate::privacy::types::WirePoint;
    use crate::privacy::*;

    const AUTHORITY: &str = "light1pg9q5zs2pg9q5zs2pg9q5zs2pg9q5zs2n7qz7p";
    const SENDER: &str = "light1qyqszqgpqyqszqgpqyqszqgpqyqszqgpdjnkkj";
    const RECIPIENT: &str = "light1zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg37u92fp";
    const DENOM: &str = "ulight";

    type TestPool<S> = PrivacyPool<S, MemoryBank, MemoryEventSink>;

    fn pool_over<S: KvStore>(store: S) -> TestPool<S> {
        let mut pool = PrivacyPool::new(store, MemoryBank::new("light"), MemoryEventSink::new(), AUTHORITY)
            .unwrap();
        pool.init_params(PoolParams::enabled_for(&[DENOM, "uatom"])).unwrap();
        pool.bank().fund(SENDER, &Coin::new(DENOM, 10_000)).unwrap();
        pool
    }

    fn setup() -> TestPool<MemoryStore> {
        pool_over(MemoryStore::new())
    }

    fn ctx(height: u64) -> BlockContext {
        BlockContext::from_tx_bytes(height, &height.to_be_bytes())
    }

    fn shield_to<S: KvStore>(pool: &mut TestPool<S>, keys: &StealthKeyPair, amount: u64, height: u64) -> u64 {
        let msg = build_shield(SENDER, Coin::new(DENOM, amount), &keys.public_keys()).unwrap();
        pool.shield(&ctx(height), msg).unwrap().deposit_index
    }

    fn scan<S: KvStore>(pool: &TestPool<S>, keys: &StealthKeyPair) -> Vec<OwnedDeposit> {
        NoteScanner::new(keys.clone())
            .scan_pool(&pool.queries(), DENOM)
            .unwrap()
    }

    fn next_index<S: KvStore>(pool: &TestPool<S>) -> u64 {
        pool.queries().next_deposit_index(DENOM).unwrap().next_index
    }

    #[test]
    fn test_double_spend_scenario() {
        println!("Step 1: shield 100 to alice");
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        let carol = StealthKeyPair::generate();
        assert_eq!(shield_to(&mut pool, &alice, 100, 1), 0);

        println!("Step 2: alice spends deposit 0 to bob");
        let owned = scan(&pool, &alice);
        assert_eq!(owned.len(), 1);
        let transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        let response = pool.private_transfer(&ctx(2), transfer.clone()).unwrap();
        assert_eq!(response.output_indices, vec![1]);

        println!("Step 3: resubmitting the same transfer is a double spend");
        let err = pool.private_transfer(&ctx(3), transfer).unwrap_err();
        assert!(matches!(err, PoolError::NullifierAlreadyUsed(_)));
        assert_eq!(err.kind(), ErrorKind::DoubleSpend);

        println!("Step 4: a different transfer reusing the nullifier fails too");
        let other = build_private_transfer(SENDER, DENOM, &owned, &[(carol.public_keys(), 100)]).unwrap();
        let err = pool.private_transfer(&ctx(4), other).unwrap_err();
        assert!(err.is_double_spend());

        assert_eq!(next_index(&pool), 2);
        assert!(scan(&pool, &carol).is_empty());
        assert_eq!(pool.events().count(event_types::PRIVATE_TRANSFER), 1);
    }

    #[test]
    fn test_shield_scan_unshield() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();

        println!("Step 1: shield 100 {}", DENOM);
        shield_to(&mut pool, &alice, 100, 10);
        assert_eq!(pool.bank().balance(SENDER, DENOM), 9_900);
        assert_eq!(pool.bank().supply(DENOM), 9_900);
        assert_eq!(pool.bank().custody_balance(DENOM), 0);

        println!("Step 2: scan recovers the note");
        let owned = scan(&pool, &alice);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].amount, 100);

        println!("Step 3: unshield to the recipient");
        let msg = build_unshield(RECIPIENT, &owned[0]).unwrap();
        let response = pool.unshield(&ctx(11), msg.clone()).unwrap();
        assert_eq!(response.amount, Coin::new(DENOM, 100));
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 100);
        assert_eq!(pool.bank().supply(DENOM), 10_000);

        let deposit = pool.queries().deposit(DENOM, 0).unwrap();
        assert_eq!(deposit.nullifier.as_deref(), Some(&owned[0].nullifier.as_bytes()[..]));
        let status = pool.queries().is_nullifier_used(owned[0].nullifier.as_bytes()).unwrap();
        assert!(status.used);
        assert_eq!(status.spent_at_height, Some(11));
        assert_eq!(status.spent_tx_hash, Some(ctx(11).tx_hash));

        println!("Step 4: a second unshield is a double spend");
        let err = pool.unshield(&ctx(12), msg).unwrap_err();
        assert!(err.is_double_spend());
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 100);

        let events = pool.events().events();
        assert_eq!(
            events.last(),
            Some(&PoolEvent::Unshield {
                recipient: RECIPIENT.to_string(),
                denom: DENOM.to_string(),
                amount: 100,
                deposit_index: 0,
                block_height: 11,
            })
        );
        assert!(scan(&pool, &alice)[0].spent);
    }

    #[test]
    fn test_transfer_to_two_recipients() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        let carol = StealthKeyPair::generate();

        shield_to(&mut pool, &alice, 300, 1);
        let owned = scan(&pool, &alice);
        let transfer = build_private_transfer(
            SENDER,
            DENOM,
            &owned,
            &[(bob.public_keys(), 150), (carol.public_keys(), 150)],
        )
        .unwrap();
        let response = pool.private_transfer(&ctx(2), transfer).unwrap();
        assert_eq!(response.output_indices, vec![1, 2]);

        let bob_owned = scan(&pool, &bob);
        let carol_owned = scan(&pool, &carol);
        assert_eq!(bob_owned.len(), 1);
        assert_eq!(carol_owned.len(), 1);
        assert_eq!(bob_owned[0].amount, 150);
        assert_eq!(carol_owned[0].amount, 150);
        assert!(scan(&pool, &alice)[0].spent);

        let stored: Vec<PedersenCommitment> = (0..3)
            .map(|i| {
                let deposit = pool.queries().deposit(DENOM, i).unwrap();
                PedersenCommitment::from_point(deposit.commitment.to_point().unwrap())
            })
            .collect();
        assert!(verify_multi_balance(&stored[..1], &stored[1..], 0));

        // bob can spend onward
        let onward = build_unshield(RECIPIENT, &bob_owned[0]).unwrap();
        pool.unshield(&ctx(3), onward).unwrap();
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 150);
    }

    #[test]
    fn test_shield_validation_order_and_rejections() {
        let alice = StealthKeyPair::generate().public_keys();
        let valid = build_shield(SENDER, Coin::new(DENOM, 100), &alice).unwrap();

        // disabled wins over everything else
        let mut disabled = PrivacyPool::new(
            MemoryStore::new(),
            MemoryBank::new("light"),
            MemoryEventSink::new(),
            AUTHORITY,
        )
        .unwrap();
        let mut bad_sender = valid.clone();
        bad_sender.sender = "nope".to_string();
        assert!(matches!(disabled.shield(&ctx(1), bad_sender.clone()), Err(PoolError::ModuleDisabled)));

        let mut pool = setup();
        let err = pool.shield(&ctx(1), bad_sender).unwrap_err();
        assert!(matches!(err, PoolError::InvalidAddress(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let mut msg = valid.clone();
        msg.amount.denom = "uother".to_string();
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::DenomNotAllowed(_))));

        let mut msg = valid.clone();
        msg.amount.amount = 0;
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidAmount(_))));

        let mut msg = valid.clone();
        msg.one_time_address.address.x.pop();
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidOneTimeAddress(_))));

        let mut msg = valid.clone();
        msg.one_time_address.tx_public_key.y[31] ^= 1;
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidOneTimeAddress(_))));

        let mut msg = valid.clone();
        msg.commitment.y[31] ^= 1;
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidCommitment(_))));

        let mut msg = valid.clone();
        msg.encrypted_note.encrypted_data.clear();
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidNote(_))));

        let mut msg = valid.clone();
        msg.encrypted_note.encrypted_data = vec![7u8; 512 + 48 + 1];
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::MemoTooLarge(_))));

        let mut msg = valid.clone();
        msg.encrypted_note.nonce.pop();
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidNote(_))));

        let mut msg = valid.clone();
        msg.encrypted_note.ephemeral_key = WirePoint {
            x: vec![0u8; 32],
            y: vec![0u8; 32],
        };
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InvalidNote(_))));

        let mut msg = valid.clone();
        msg.amount.amount = 20_000;
        assert!(matches!(pool.shield(&ctx(1), msg), Err(PoolError::InsufficientFunds(_))));

        // nothing was recorded or moved
        assert_eq!(next_index(&pool), 0);
        assert_eq!(pool.bank().balance(SENDER, DENOM), 10_000);
        assert_eq!(pool.events().count(event_types::SHIELD), 0);

        // ledger only checks structure: a max-size opaque note is accepted
        let mut msg = valid.clone();
        msg.encrypted_note.encrypted_data = vec![7u8; 512 + 48];
        assert_eq!(pool.shield(&ctx(2), msg).unwrap().deposit_index, 0);
        assert_eq!(pool.shield(&ctx(3), valid).unwrap().deposit_index, 1);
    }

    #[test]
    fn test_min_shield_amount() {
        let mut pool = setup();
        let mut params = pool.params().unwrap();
        params.min_shield_amounts.insert(DENOM.to_string(), "50".to_string());
        pool.update_params(MsgUpdateParams {
            authority: AUTHORITY.to_string(),
            params,
        })
        .unwrap();

        let keys = StealthKeyPair::generate().public_keys();
        let small = build_shield(SENDER, Coin::new(DENOM, 49), &keys).unwrap();
        assert!(matches!(pool.shield(&ctx(1), small), Err(PoolError::AmountBelowMinimum(_))));
        let exact = build_shield(SENDER, Coin::new(DENOM, 50), &keys).unwrap();
        pool.shield(&ctx(1), exact).unwrap();
    }

    #[test]
    fn test_duplicate_nullifier_within_one_transfer() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 100, 1);

        let owned = scan(&pool, &alice);
        let doubled = vec![owned[0].clone(), owned[0].clone()];
        let transfer = build_private_transfer(SENDER, DENOM, &doubled, &[(bob.public_keys(), 200)]).unwrap();

        let err = pool.private_transfer(&ctx(2), transfer).unwrap_err();
        match err {
            PoolError::NullifierAlreadyUsed(context) => assert!(context.contains("input 1")),
            other => panic!("unexpected error: {}", other),
        }

        // first input's staged spend was discarded
        assert!(!pool.queries().deposit(DENOM, 0).unwrap().is_spent());
        assert!(!pool.queries().is_nullifier_used(owned[0].nullifier.as_bytes()).unwrap().used);
        assert_eq!(next_index(&pool), 1);
    }

    #[test]
    fn test_failed_transfer_leaves_no_trace() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 40, 1);
        shield_to(&mut pool, &alice, 60, 2);
        let owned = scan(&pool, &alice);
        assert_eq!(owned.len(), 2);

        // second input carries the first input's signature
        let mut transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        transfer.inputs[1].signature = transfer.inputs[0].signature.clone();
        let err = pool.private_transfer(&ctx(3), transfer).unwrap_err();
        assert!(matches!(err, PoolError::InvalidSignature(_)));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        // inputs fine, output denom wrong
        let mut transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        transfer.outputs[0].denom = "uatom".to_string();
        assert!(matches!(pool.private_transfer(&ctx(3), transfer), Err(PoolError::InvalidDenom(_))));

        // inputs fine, balance commitment malformed
        let mut transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        transfer.balance_commitment.x.truncate(16);
        assert!(matches!(
            pool.private_transfer(&ctx(3), transfer),
            Err(PoolError::InvalidBalanceCommitment(_))
        ));

        // inputs fine, output note oversized
        let mut transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        transfer.outputs[0].encrypted_note.encrypted_data = vec![1u8; 4096];
        assert!(matches!(pool.private_transfer(&ctx(3), transfer), Err(PoolError::MemoTooLarge(_))));

        for index in 0..2 {
            assert!(!pool.queries().deposit(DENOM, index).unwrap().is_spent());
        }
        for d in &owned {
            assert!(!pool.queries().is_nullifier_used(d.nullifier.as_bytes()).unwrap().used);
        }
        assert_eq!(next_index(&pool), 2);
        assert_eq!(pool.events().count(event_types::PRIVATE_TRANSFER), 0);

        // the untouched deposits are still spendable
        let transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        pool.private_transfer(&ctx(4), transfer).unwrap();
        assert_eq!(scan(&pool, &bob)[0].amount, 100);
    }

    #[test]
    fn test_forged_signatures_are_unauthorized() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 100, 1);
        let owned = scan(&pool, &alice);

        println!("Step 1: flipped byte in a spend signature");
        let mut transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 100)]).unwrap();
        transfer.inputs[0].signature[10] ^= 0x01;
        let err = pool.private_transfer(&ctx(2), transfer).unwrap_err();
        assert!(matches!(err, PoolError::InvalidSignature(_)));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!err.kind().is_retryable());

        println!("Step 2: flipped byte in an unshield signature");
        let mut unshield = build_unshield(RECIPIENT, &owned[0]).unwrap();
        unshield.signature[10] ^= 0x01;
        let err = pool.unshield(&ctx(3), unshield).unwrap_err();
        assert!(matches!(err, PoolError::InvalidSignature(_)));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        println!("Step 3: missing unshield signature");
        let mut unshield = build_unshield(RECIPIENT, &owned[0]).unwrap();
        unshield.signature.clear();
        assert_eq!(pool.unshield(&ctx(3), unshield).unwrap_err().kind(), ErrorKind::Unauthorized);

        assert!(!pool.queries().deposit(DENOM, 0).unwrap().is_spent());
        assert!(!pool.queries().is_nullifier_used(owned[0].nullifier.as_bytes()).unwrap().used);
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 0);

        println!("Step 4: the honest signature still spends");
        pool.unshield(&ctx(4), build_unshield(RECIPIENT, &owned[0]).unwrap()).unwrap();
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 100);
    }

    /// Bank whose second leg of a shield fails
    struct BurnRefusingBank(MemoryBank);

    impl BankLedger for BurnRefusingBank {
        fn validate_address(&self, address: &str) -> Result<(), BankError> {
            self.0.validate_address(address)
        }

        fn transfer_to_custody(&self, address: &str, coin: &Coin) -> Result<(), BankError> {
            self.0.transfer_to_custody(address, coin)
        }

        fn burn_from_custody(&self, _coin: &Coin) -> Result<(), BankError> {
            Err(BankError::Backend("burn refused".to_string()))
        }

        fn mint_to_custody(&self, coin: &Coin) -> Result<(), BankError> {
            self.0.mint_to_custody(coin)
        }

        fn transfer_from_custody(&self, address: &str, coin: &Coin) -> Result<(), BankError> {
            self.0.transfer_from_custody(address, coin)
        }
    }

    #[test]
    fn test_bank_failure_leaves_store_untouched() {
        let bank = BurnRefusingBank(MemoryBank::new("light"));
        bank.0.fund(SENDER, &Coin::new(DENOM, 500)).unwrap();
        let mut pool = PrivacyPool::new(MemoryStore::new(), bank, MemoryEventSink::new(), AUTHORITY).unwrap();
        pool.init_params(PoolParams::enabled_for(&[DENOM])).unwrap();

        let alice = StealthKeyPair::generate();
        let msg = build_shield(SENDER, Coin::new(DENOM, 100), &alice.public_keys()).unwrap();
        let err = pool.shield(&ctx(1), msg).unwrap_err();
        assert!(matches!(err, PoolError::Bank(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);

        // the pool's batch is dropped; the host rolls back the custody move
        assert_eq!(pool.queries().next_deposit_index(DENOM).unwrap().next_index, 0);
        assert!(pool.queries().deposit(DENOM, 0).is_err());
        assert_eq!(pool.events().count(event_types::SHIELD), 0);
    }

    #[test]
    fn test_transfer_shape_limits() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 10, 1);
        shield_to(&mut pool, &alice, 10, 2);
        let owned = scan(&pool, &alice);
        let transfer = build_private_transfer(SENDER, DENOM, &owned, &[(bob.public_keys(), 20)]).unwrap();

        let mut empty = transfer.clone();
        empty.inputs.clear();
        assert!(matches!(pool.private_transfer(&ctx(3), empty), Err(PoolError::EmptyInputs)));

        let mut empty = transfer.clone();
        empty.outputs.clear();
        assert!(matches!(pool.private_transfer(&ctx(3), empty), Err(PoolError::EmptyOutputs)));

        let mut missing = transfer.clone();
        missing.inputs[0].nullifier.clear();
        assert!(matches!(pool.private_transfer(&ctx(3), missing), Err(PoolError::InvalidNullifier(_))));

        let mut missing = transfer.clone();
        missing.inputs[0].signature.clear();
        assert!(matches!(pool.private_transfer(&ctx(3), missing), Err(PoolError::InvalidSignature(_))));

        let mut unknown = transfer.clone();
        unknown.inputs[1].deposit_index = 99;
        assert!(matches!(pool.private_transfer(&ctx(3), unknown), Err(PoolError::DepositNotFound(_))));

        let mut params = pool.params().unwrap();
        params.max_deposits_per_tx = 1;
        pool.update_params(MsgUpdateParams {
            authority: AUTHORITY.to_string(),
            params,
        })
        .unwrap();
        let err = pool.private_transfer(&ctx(3), transfer).unwrap_err();
        assert!(matches!(err, PoolError::TooManyInputs(_)));
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    }

    #[test]
    fn test_unshield_rejections() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 100, 1);
        shield_to(&mut pool, &alice, 100, 2);
        let owned = scan(&pool, &alice);
        let valid = build_unshield(RECIPIENT, &owned[0]).unwrap();

        for amount in ["0", "abc", "-5", ""] {
            let mut msg = valid.clone();
            msg.amount = amount.to_string();
            assert!(
                matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidAmount(_))),
                "amount {:?}",
                amount
            );
        }

        // signature binds the amount
        let mut msg = valid.clone();
        msg.amount = "99".to_string();
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidSignature(_))));

        // signature binds the recipient
        let mut msg = valid.clone();
        msg.recipient = SENDER.to_string();
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidSignature(_))));

        // signature is checked against the named deposit's one-time address
        let mut msg = valid.clone();
        msg.deposit_index = 1;
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidSignature(_))));

        let mut msg = valid.clone();
        msg.deposit_index = 7;
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::DepositNotFound(_))));

        let mut msg = valid.clone();
        msg.recipient = "cosmos1qyqszqgp".to_string();
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidAddress(_))));

        // right prefix and charset, broken checksum
        let mut msg = valid.clone();
        msg.recipient = format!("{}q", &RECIPIENT[..RECIPIENT.len() - 1]);
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidAddress(_))));

        let mut msg = valid.clone();
        msg.commitment.x = vec![1u8; 33];
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidCommitment(_))));

        let mut msg = valid.clone();
        msg.signature.clear();
        assert!(matches!(pool.unshield(&ctx(3), msg), Err(PoolError::InvalidSignature(_))));

        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 0);
        pool.unshield(&ctx(4), valid).unwrap();
        assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 100);
    }

    #[test]
    fn test_phase2_rejects_spends() {
        let mut pool = setup();
        let alice = StealthKeyPair::generate();
        shield_to(&mut pool, &alice, 100, 1);
        let owned = scan(&pool, &alice);

        let mut params = pool.params().unwrap();
        params.phase = Phase::Phase2;
        pool.update_params(MsgUpdateParams {
            authority: AUTHORITY.to_string(),
            params,
        })
        .unwrap();

        // shielding is phase independent
        shield_to(&mut pool, &alice, 5, 2);

        let transfer = build_private_transfer(
            SENDER,
            DENOM,
            &owned,
            &[(StealthKeyPair::generate().public_keys(), 100)],
        )
        .unwrap();
        assert!(matches!(pool.private_transfer(&ctx(3), transfer), Err(PoolError::UnsupportedPhase(_))));
        let unshield = build_unshield(RECIPIENT, &owned[0]).unwrap();
        assert!(matches!(pool.unshield(&ctx(3), unshield), Err(PoolError::UnsupportedPhase(_))));
        assert_eq!(pool.queries().stats().unwrap().phase, Phase::Phase2);
    }

    #[test]
    fn test_update_params_authority() {
        let mut pool = setup();
        let mut params = pool.params().unwrap();
        params.max_memo_size = 1024;

        let err = pool
            .update_params(MsgUpdateParams {
                authority: SENDER.to_string(),
                params: params.clone(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut invalid = params.clone();
        invalid.max_deposits_per_tx = 0;
        assert!(matches!(
            pool.update_params(MsgUpdateParams {
                authority: AUTHORITY.to_string(),
                params: invalid,
            }),
            Err(PoolError::InvalidParams(_))
        ));
        assert_eq!(pool.params().unwrap().max_memo_size, 512);

        pool.update_params(MsgUpdateParams {
            authority: AUTHORITY.to_string(),
            params,
        })
        .unwrap();
        assert_eq!(pool.params().unwrap().max_memo_size, 1024);
        assert_eq!(pool.queries().params().unwrap().max_memo_size, 1024);
        assert_eq!(
            pool.events().events(),
            vec![PoolEvent::UpdateParams {
                authority: AUTHORITY.to_string()
            }]
        );
    }

    #[test]
    fn test_queries_and_stats() {
        let mut pool = setup();
        pool.bank().fund(SENDER, &Coin::new("uatom", 500)).unwrap();
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();

        for height in 1..=3 {
            shield_to(&mut pool, &alice, 10, height);
        }
        let atom = build_shield(SENDER, Coin::new("uatom", 50), &bob.public_keys()).unwrap();
        assert_eq!(pool.shield(&ctx(4), atom).unwrap().deposit_index, 0);

        let owned = scan(&pool, &alice);
        let unshield = build_unshield(RECIPIENT, &owned[1]).unwrap();
        pool.unshield(&ctx(5), unshield).unwrap();

        let queries = pool.queries();
        let range = queries.deposits_by_range(DENOM, 1, 50).unwrap();
        assert_eq!(range.end_index, 3);
        assert!(range.deposits[0].is_spent());
        assert_eq!(range.deposits[0].created_at_height, 2);

        let all = queries.all_deposits(&Default::default()).unwrap();
        assert_eq!(all.deposits.len(), 4);

        let stats = queries.stats().unwrap();
        assert_eq!(stats.total_deposits, 4);
        assert_eq!(stats.total_spent, 1);
        assert_eq!(stats.active_deposits, 3);
        let light = stats.denom_stats.iter().find(|s| s.denom == DENOM).unwrap();
        assert_eq!(light.active_deposits, 2);
        let atom = stats.denom_stats.iter().find(|s| s.denom == "uatom").unwrap();
        assert_eq!(atom.total_deposits, 1);
        assert_eq!(atom.active_deposits, 1);
    }

    #[test]
    fn test_rocksdb_backed_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = DBConfig {
            sync_writes: false,
            ..DBConfig::at(temp_dir.path().join("pool_db"))
        };
        let alice = StealthKeyPair::generate();

        let nullifier = {
            let db = DatabaseManager::open(config.clone()).unwrap();
            let mut pool = pool_over(db);
            shield_to(&mut pool, &alice, 100, 1);
            let owned = scan(&pool, &alice);
            let msg = build_unshield(RECIPIENT, &owned[0]).unwrap();
            pool.unshield(&ctx(2), msg).unwrap();
            assert_eq!(pool.bank().balance(RECIPIENT, DENOM), 100);
            owned[0].nullifier
        };

        // reopened store keeps params, deposits and the spent set
        let db = DatabaseManager::open(config).unwrap();
        let pool = PrivacyPool::new(db, MemoryBank::new("light"), MemoryEventSink::new(), AUTHORITY).unwrap();
        assert!(pool.params().unwrap().enabled);
        assert!(pool.queries().deposit(DENOM, 0).unwrap().is_spent());
        assert!(pool.queries().is_nullifier_used(nullifier.as_bytes()).unwrap().used);
        assert_eq!(pool.queries().next_deposit_index(DENOM).unwrap().next_index, 1);
    }
}
