//! Client-side message builders
//!
//! Wallet helpers that turn stealth public keys and scanned deposits into
//! signed pool messages.

use anyhow::{anyhow, bail, ensure, Context, Result};

use crate::crypto::commitments::generate_blinding;
use crate::crypto::signatures::{sign_nullifier, sign_unshield};
use crate::crypto::stealth::generate_stealth_address;
use crate::crypto::{NoteEncryption, PedersenCommitment, Scalar, StealthPublicKeys};
use crate::privacy::note_scanner::OwnedDeposit;
use crate::privacy::types::*;

/// A fresh deposit addressed to `recipient`
struct DraftOutput {
    one_time_address: OneTimeAddressData,
    commitment: PedersenCommitment,
    encrypted_note: EncryptedNoteData,
}

fn draft_output(recipient: &StealthPublicKeys, amount: u64, blinding: &Scalar) -> Result<DraftOutput> {
    let stealth = generate_stealth_address(&recipient.view, &recipient.spend)
        .context("failed to derive one-time address")?;
    let commitment = PedersenCommitment::create(amount, blinding)?;
    let note = NoteEncryption::encrypt_note(amount, blinding, &stealth.shared_secret)?;
    Ok(DraftOutput {
        one_time_address: OneTimeAddressData::from_one_time(&stealth.one_time)?,
        commitment,
        encrypted_note: EncryptedNoteData::from_ciphertext(&note)?,
    })
}

/// Shield `amount` from `sender` to `recipient`
pub fn build_shield(sender: &str, amount: Coin, recipient: &StealthPublicKeys) -> Result<MsgShield> {
    ensure!(amount.amount > 0, "shield amount must be positive");
    let draft = draft_output(recipient, amount.amount, &generate_blinding())?;
    Ok(MsgShield {
        sender: sender.to_string(),
        amount,
        one_time_address: draft.one_time_address,
        commitment: WirePoint::from_point(draft.commitment.point())?,
        encrypted_note: draft.encrypted_note,
    })
}

/// Spend `inputs` into `outputs` of `(recipient, amount)`.
///
/// The last output's blinding absorbs the difference so that
/// `Σ C_in == Σ C_out`; that sum is sent as the balance commitment.
///
/// With one output, `C_out` is forced to `Σ C_in`, so a single-input,
/// single-output transfer republishes the input commitment unchanged and is
/// linkable on the ledger. Add a change output or split the amount to avoid
/// that.
pub fn build_private_transfer(
    sender: &str,
    denom: &str,
    inputs: &[OwnedDeposit],
    outputs: &[(StealthPublicKeys, u64)],
) -> Result<MsgPrivateTransfer> {
    ensure!(!inputs.is_empty(), "at least one input is required");
    ensure!(!outputs.is_empty(), "at least one output is required");

    let mut total_in: u64 = 0;
    let mut blinding_in = Scalar::ZERO;
    for input in inputs {
        if input.denom != denom {
            bail!("input {} is {}, not {}", input.index, input.denom, denom);
        }
        if input.spent {
            bail!("input {} is already spent", input.index);
        }
        total_in = total_in
            .checked_add(input.amount)
            .ok_or_else(|| anyhow!("input total overflows"))?;
        blinding_in += input.blinding;
    }

    let mut total_out: u64 = 0;
    for (_, amount) in outputs {
        ensure!(*amount > 0, "output amounts must be positive");
        total_out = total_out
            .checked_add(*amount)
            .ok_or_else(|| anyhow!("output total overflows"))?;
    }
    if total_in != total_out {
        bail!("balance mismatch: inputs {} != outputs {}", total_in, total_out);
    }

    let mut blinding_out = Scalar::ZERO;
    let mut drafts = Vec::with_capacity(outputs.len());
    for (i, (recipient, amount)) in outputs.iter().enumerate() {
        let blinding = if i + 1 == outputs.len() {
            blinding_in - blinding_out
        } else {
            generate_blinding()
        };
        blinding_out += blinding;
        drafts.push(draft_output(recipient, *amount, &blinding)?);
    }

    let total_commitment = drafts
        .iter()
        .skip(1)
        .fold(drafts[0].commitment, |acc, d| acc.add(&d.commitment));

    let mut transfer_inputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let signature = sign_nullifier(&input.one_time_private_key, &input.nullifier)?;
        transfer_inputs.push(TransferInput {
            deposit_index: input.index,
            nullifier: input.nullifier.as_bytes().to_vec(),
            signature: signature.to_vec(),
        });
    }

    let transfer_outputs = drafts
        .into_iter()
        .map(|d| {
            Ok(TransferOutput {
                denom: denom.to_string(),
                one_time_address: d.one_time_address,
                commitment: WirePoint::from_point(d.commitment.point())?,
                encrypted_note: d.encrypted_note,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MsgPrivateTransfer {
        sender: sender.to_string(),
        denom: denom.to_string(),
        inputs: transfer_inputs,
        outputs: transfer_outputs,
        balance_commitment: WirePoint::from_point(total_commitment.point())?,
        zk_proof: None,
    })
}

/// Withdraw the whole of `deposit` to `recipient`
pub fn build_unshield(recipient: &str, deposit: &OwnedDeposit) -> Result<MsgUnshield> {
    if deposit.spent {
        bail!("deposit {} is already spent", deposit.index);
    }
    let amount = deposit.amount.to_string();
    let signature = sign_unshield(&deposit.one_time_private_key, &deposit.nullifier, recipient, &amount)?;
    Ok(MsgUnshield {
        recipient: recipient.to_string(),
        denom: deposit.denom.clone(),
        amount,
        nullifier: deposit.nullifier.as_bytes().to_vec(),
        commitment: WirePoint::from_point(deposit.commitment.point())?,
        signature: signature.to_vec(),
        deposit_index: deposit.index,
        zk_proof: None,
    })
}
