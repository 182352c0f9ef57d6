//! Privacy Pool Implementation
//!
//! Shield / PrivateTransfer / Unshield state machine over a [`KvStore`].
//!
//! Every operation validates first, stages its writes in an
//! [`AtomicBatchWriter`], runs its bank movements and only then commits the
//! batch. Any error before the commit leaves the store untouched.

use crate::crypto::ecies::NONCE_LEN;
use crate::crypto::nullifiers::Nullifier;
use crate::crypto::signatures::{verify_nullifier_signature, verify_unshield_signature};
use crate::database::keys;
use crate::database::records;
use crate::database::{AtomicBatchWriter, KvStore, QueryEngine, StateRead};
use crate::privacy::bank::BankLedger;
use crate::privacy::errors::{PoolError, PoolResult};
use crate::privacy::events::{EventSink, PoolEvent};
use crate::privacy::params::{Phase, PoolParams};
use crate::privacy::types::*;

/// Privacy pool state machine
pub struct PrivacyPool<S: KvStore, B: BankLedger, E: EventSink> {
    store: S,
    bank: B,
    events: E,
    /// Only this address may replace params
    authority: String,
}

impl<S: KvStore, B: BankLedger, E: EventSink> PrivacyPool<S, B, E> {
    /// Wrap a store. Writes default params if the store has none.
    pub fn new(store: S, bank: B, events: E, authority: impl Into<String>) -> PoolResult<Self> {
        let pool = Self {
            store,
            bank,
            events,
            authority: authority.into(),
        };
        if !pool.store.contains(&keys::params_key())? {
            let mut batch = AtomicBatchWriter::new(&pool.store);
            batch.put_record(keys::params_key(), &PoolParams::default())?;
            batch.commit()?;
            log::info!("Initialized default pool params");
        }
        Ok(pool)
    }

    /// Install params without an authority check (chain bootstrap)
    pub fn init_params(&mut self, params: PoolParams) -> PoolResult<()> {
        params.validate()?;
        let mut batch = AtomicBatchWriter::new(&self.store);
        batch.put_record(keys::params_key(), &params)?;
        batch.commit()?;
        log::info!(
            "Pool params installed: enabled={} denoms={:?} phase={}",
            params.enabled,
            params.allowed_denoms,
            params.phase
        );
        Ok(())
    }

    pub fn params(&self) -> PoolResult<PoolParams> {
        load_params(&self.store)
    }

    pub fn queries(&self) -> QueryEngine<'_, S> {
        QueryEngine::new(&self.store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Move public funds into the pool as a new deposit
    pub fn shield(&mut self, ctx: &BlockContext, msg: MsgShield) -> PoolResult<MsgShieldResponse> {
        let params = load_params(&self.store)?;
        if !params.enabled {
            return Err(PoolError::ModuleDisabled);
        }
        self.bank.validate_address(&msg.sender)?;

        let denom = msg.amount.denom.as_str();
        if !params.is_denom_allowed(denom) {
            return Err(PoolError::DenomNotAllowed(format!(
                "denomination {} is not allowed for privacy operations",
                denom
            )));
        }
        if msg.amount.amount == 0 {
            return Err(PoolError::InvalidAmount("amount must be positive".to_string()));
        }
        let minimum = params
            .min_shield_amount(denom)
            .map_err(|_| PoolError::InvalidAmount(format!("invalid minimum shield amount for {}", denom)))?;
        if let Some(minimum) = minimum {
            if msg.amount.amount < minimum {
                return Err(PoolError::AmountBelowMinimum(format!(
                    "amount {} is below minimum {} for {}",
                    msg.amount.amount, minimum, denom
                )));
            }
        }
        validate_note_fields(
            &params,
            &msg.one_time_address,
            &msg.commitment,
            &msg.encrypted_note,
            "",
        )?;

        let mut batch = AtomicBatchWriter::new(&self.store);
        let deposit_index = assign_deposit_index(&mut batch, denom)?;
        let deposit = PrivateDeposit {
            denom: denom.to_string(),
            index: deposit_index,
            commitment: msg.commitment,
            one_time_address: msg.one_time_address,
            encrypted_note: msg.encrypted_note,
            nullifier: None,
            created_at_height: ctx.height,
            tx_hash: ctx.tx_hash.clone(),
        };
        batch.put_record(keys::deposit_key(denom, deposit_index), &deposit)?;

        self.bank.transfer_to_custody(&msg.sender, &msg.amount)?;
        self.bank.burn_from_custody(&msg.amount)?;
        batch.commit()?;

        log::info!(
            "Shielded deposit: sender={} denom={} index={} height={}",
            msg.sender,
            denom,
            deposit_index,
            ctx.height
        );
        self.events.emit(PoolEvent::Shield {
            sender: msg.sender,
            denom: denom.to_string(),
            amount: msg.amount.amount,
            deposit_index,
            block_height: ctx.height,
        });

        Ok(MsgShieldResponse {
            denom: denom.to_string(),
            deposit_index,
        })
    }

    /// Spend deposits into new deposits of the same denom
    pub fn private_transfer(
        &mut self,
        ctx: &BlockContext,
        msg: MsgPrivateTransfer,
    ) -> PoolResult<MsgPrivateTransferResponse> {
        let params = load_params(&self.store)?;
        if !params.enabled {
            return Err(PoolError::ModuleDisabled);
        }
        require_phase1(&params)?;

        let denom = msg.denom.as_str();
        if !params.is_denom_allowed(denom) {
            return Err(PoolError::DenomNotAllowed(format!("denomination {} is not allowed", denom)));
        }
        let max = params.max_deposits_per_tx as usize;
        if msg.inputs.is_empty() {
            return Err(PoolError::EmptyInputs);
        }
        if msg.inputs.len() > max {
            return Err(PoolError::TooManyInputs(format!("got {} inputs, max {}", msg.inputs.len(), max)));
        }
        if msg.outputs.is_empty() {
            return Err(PoolError::EmptyOutputs);
        }
        if msg.outputs.len() > max {
            return Err(PoolError::TooManyOutputs(format!(
                "got {} outputs, max {}",
                msg.outputs.len(),
                max
            )));
        }

        let mut batch = AtomicBatchWriter::new(&self.store);

        for (i, input) in msg.inputs.iter().enumerate() {
            if input.nullifier.is_empty() {
                return Err(PoolError::InvalidNullifier(format!("input {} has empty nullifier", i)));
            }
            // sees nullifiers staged by earlier inputs
            if batch.contains(&keys::nullifier_key(&input.nullifier))? {
                return Err(PoolError::NullifierAlreadyUsed(format!("input {} nullifier already used", i)));
            }

            let mut deposit = load_deposit(&batch, denom, input.deposit_index)?.ok_or_else(|| {
                PoolError::DepositNotFound(format!(
                    "deposit {} not found for input {}",
                    input.deposit_index, i
                ))
            })?;
            if deposit.is_spent() {
                return Err(PoolError::DepositAlreadySpent(format!(
                    "input {} deposit {} already spent",
                    i, input.deposit_index
                )));
            }

            if input.signature.is_empty() {
                return Err(PoolError::InvalidSignature(format!("input {} missing signature", i)));
            }
            if !spend_signature_valid(&deposit, &input.nullifier, &input.signature) {
                return Err(PoolError::InvalidSignature(format!(
                    "input {} signature verification failed",
                    i
                )));
            }

            deposit.nullifier = Some(input.nullifier.clone());
            batch.put_record(keys::deposit_key(denom, input.deposit_index), &deposit)?;
            stage_used_nullifier(&mut batch, ctx, denom, &input.nullifier)?;
        }

        // structural only: no range proofs in phase 1
        msg.balance_commitment
            .to_point()
            .map_err(|e| PoolError::InvalidBalanceCommitment(e.to_string()))?;

        let mut output_indices = Vec::with_capacity(msg.outputs.len());
        for (i, output) in msg.outputs.into_iter().enumerate() {
            if output.denom != denom {
                return Err(PoolError::InvalidDenom(format!(
                    "output {} has mismatched denom: expected {}, got {}",
                    i, denom, output.denom
                )));
            }
            validate_note_fields(
                &params,
                &output.one_time_address,
                &output.commitment,
                &output.encrypted_note,
                &format!("output {}: ", i),
            )?;

            let index = assign_deposit_index(&mut batch, denom)?;
            let deposit = PrivateDeposit {
                denom: denom.to_string(),
                index,
                commitment: output.commitment,
                one_time_address: output.one_time_address,
                encrypted_note: output.encrypted_note,
                nullifier: None,
                created_at_height: ctx.height,
                tx_hash: ctx.tx_hash.clone(),
            };
            batch.put_record(keys::deposit_key(denom, index), &deposit)?;
            output_indices.push(index);
        }

        let staged = batch.commit()?;
        log::info!(
            "Private transfer: denom={} inputs={} outputs={:?} height={} keys={}",
            denom,
            msg.inputs.len(),
            output_indices,
            ctx.height,
            staged
        );
        self.events.emit(PoolEvent::PrivateTransfer {
            denom: denom.to_string(),
            input_count: msg.inputs.len(),
            output_count: output_indices.len(),
            block_height: ctx.height,
        });

        Ok(MsgPrivateTransferResponse { output_indices })
    }

    /// Spend a deposit back to a public balance
    pub fn unshield(&mut self, ctx: &BlockContext, msg: MsgUnshield) -> PoolResult<MsgUnshieldResponse> {
        let params = load_params(&self.store)?;
        if !params.enabled {
            return Err(PoolError::ModuleDisabled);
        }
        require_phase1(&params)?;
        self.bank.validate_address(&msg.recipient)?;

        let denom = msg.denom.as_str();
        if !params.is_denom_allowed(denom) {
            return Err(PoolError::DenomNotAllowed(format!("denomination {} is not allowed", denom)));
        }
        let amount = match msg.amount.parse::<u64>() {
            Ok(amount) if amount > 0 => amount,
            _ => {
                return Err(PoolError::InvalidAmount(
                    "amount must be a positive integer".to_string(),
                ))
            }
        };

        if msg.nullifier.is_empty() {
            return Err(PoolError::InvalidNullifier("nullifier is empty".to_string()));
        }
        if self.store.contains(&keys::nullifier_key(&msg.nullifier))? {
            return Err(PoolError::NullifierAlreadyUsed(hex::encode(&msg.nullifier)));
        }
        msg.commitment
            .to_point()
            .map_err(|e| PoolError::InvalidCommitment(e.to_string()))?;

        let mut batch = AtomicBatchWriter::new(&self.store);
        let mut deposit = load_deposit(&batch, denom, msg.deposit_index)?
            .ok_or_else(|| PoolError::DepositNotFound(format!("deposit {} not found", msg.deposit_index)))?;
        if deposit.is_spent() {
            return Err(PoolError::DepositAlreadySpent(format!(
                "deposit {} already spent",
                msg.deposit_index
            )));
        }

        if msg.signature.is_empty() {
            return Err(PoolError::InvalidSignature("signature required".to_string()));
        }
        if !unshield_signature_valid(&deposit, &msg) {
            return Err(PoolError::InvalidSignature("signature verification failed".to_string()));
        }

        deposit.nullifier = Some(msg.nullifier.clone());
        batch.put_record(keys::deposit_key(denom, msg.deposit_index), &deposit)?;
        stage_used_nullifier(&mut batch, ctx, denom, &msg.nullifier)?;

        let coin = Coin::new(denom, amount);
        self.bank.mint_to_custody(&coin)?;
        self.bank.transfer_from_custody(&msg.recipient, &coin)?;
        batch.commit()?;

        log::info!(
            "Unshielded deposit: recipient={} amount={} index={} height={}",
            msg.recipient,
            coin,
            msg.deposit_index,
            ctx.height
        );
        self.events.emit(PoolEvent::Unshield {
            recipient: msg.recipient,
            denom: denom.to_string(),
            amount,
            deposit_index: msg.deposit_index,
            block_height: ctx.height,
        });

        Ok(MsgUnshieldResponse { amount: coin })
    }

    /// Replace params; authority only
    pub fn update_params(&mut self, msg: MsgUpdateParams) -> PoolResult<()> {
        if msg.authority != self.authority {
            return Err(PoolError::Unauthorized(format!(
                "invalid authority; expected {}, got {}",
                self.authority, msg.authority
            )));
        }
        msg.params.validate()?;

        let mut batch = AtomicBatchWriter::new(&self.store);
        batch.put_record(keys::params_key(), &msg.params)?;
        batch.commit()?;

        log::info!(
            "Params updated: authority={} enabled={} phase={}",
            msg.authority,
            msg.params.enabled,
            msg.params.phase
        );
        self.events.emit(PoolEvent::UpdateParams {
            authority: msg.authority,
        });
        Ok(())
    }
}

fn load_params<R: StateRead + ?Sized>(reader: &R) -> PoolResult<PoolParams> {
    Ok(records::load(reader, &keys::params_key())?.unwrap_or_default())
}

fn load_deposit<R: StateRead + ?Sized>(
    reader: &R,
    denom: &str,
    index: u64,
) -> PoolResult<Option<PrivateDeposit>> {
    Ok(records::load(reader, &keys::deposit_key(denom, index))?)
}

fn require_phase1(params: &PoolParams) -> PoolResult<()> {
    match params.phase {
        Phase::Phase1 => Ok(()),
        Phase::Phase2 => Err(PoolError::UnsupportedPhase(
            "zk-proof spends (phase2) are not supported".to_string(),
        )),
    }
}

/// Current counter value; the counter advances by one
fn assign_deposit_index<S: KvStore + ?Sized>(
    batch: &mut AtomicBatchWriter<'_, S>,
    denom: &str,
) -> PoolResult<u64> {
    let key = keys::next_deposit_index_key(denom);
    let current = match batch.get(&key)? {
        None => 0,
        Some(bytes) => keys::decode_index(&bytes)
            .ok_or_else(|| PoolError::Store(anyhow::anyhow!("corrupt deposit index for {}", denom)))?,
    };
    let next = current
        .checked_add(1)
        .ok_or_else(|| PoolError::Store(anyhow::anyhow!("deposit index overflow for {}", denom)))?;
    batch.put(key, keys::encode_index(next).to_vec());
    Ok(current)
}

fn stage_used_nullifier<S: KvStore + ?Sized>(
    batch: &mut AtomicBatchWriter<'_, S>,
    ctx: &BlockContext,
    denom: &str,
    nullifier: &[u8],
) -> PoolResult<()> {
    let used = UsedNullifier {
        nullifier: nullifier.to_vec(),
        spent_at_height: ctx.height,
        spent_tx_hash: ctx.tx_hash.clone(),
        denom: denom.to_string(),
    };
    batch.put_record(keys::nullifier_key(nullifier), &used)?;
    Ok(())
}

/// Structural checks shared by Shield and transfer outputs
fn validate_note_fields(
    params: &PoolParams,
    one_time: &OneTimeAddressData,
    commitment: &WirePoint,
    note: &EncryptedNoteData,
    context: &str,
) -> PoolResult<()> {
    one_time
        .address
        .to_point()
        .map_err(|e| PoolError::InvalidOneTimeAddress(format!("{}address: {}", context, e)))?;
    one_time
        .tx_public_key
        .to_point()
        .map_err(|e| PoolError::InvalidOneTimeAddress(format!("{}tx public key: {}", context, e)))?;
    commitment
        .to_point()
        .map_err(|e| PoolError::InvalidCommitment(format!("{}{}", context, e)))?;

    if note.encrypted_data.is_empty() {
        return Err(PoolError::InvalidNote(format!("{}encrypted data is empty", context)));
    }
    if note.encrypted_data.len() > params.max_note_size() {
        return Err(PoolError::MemoTooLarge(format!(
            "{}encrypted note is {} bytes, max {}",
            context,
            note.encrypted_data.len(),
            params.max_note_size()
        )));
    }
    if note.nonce.len() != NONCE_LEN {
        return Err(PoolError::InvalidNote(format!(
            "{}nonce must be {} bytes for AES-GCM",
            context, NONCE_LEN
        )));
    }
    note.ephemeral_key
        .to_point()
        .map_err(|e| PoolError::InvalidNote(format!("{}ephemeral key: {}", context, e)))?;
    Ok(())
}

/// Any parse failure counts as a bad signature
fn spend_signature_valid(deposit: &PrivateDeposit, nullifier: &[u8], signature: &[u8]) -> bool {
    let (Ok(one_time), Ok(nullifier)) = (
        deposit.one_time_address.address.to_point(),
        Nullifier::from_bytes(nullifier),
    ) else {
        return false;
    };
    verify_nullifier_signature(&one_time, &nullifier, signature)
}

fn unshield_signature_valid(deposit: &PrivateDeposit, msg: &MsgUnshield) -> bool {
    let (Ok(one_time), Ok(nullifier)) = (
        deposit.one_time_address.address.to_point(),
        Nullifier::from_bytes(&msg.nullifier),
    ) else {
        return false;
    };
    verify_unshield_signature(&one_time, &nullifier, &msg.recipient, &msg.amount, &msg.signature)
}
