//! Note Scanner for Wallet Discovery
//!
//! Finds the deposits a stealth key pair owns. Each candidate costs one ECDH,
//! so scans fan out over rayon's global pool. A match is only reported once
//! its note decrypts and the commitment opens to the decrypted amount.

use rayon::prelude::*;

use crate::crypto::stealth::compute_shared_secret;
use crate::crypto::{
    NoteEncryption, Nullifier, OneTimeAddress, PedersenCommitment, Scalar, StealthKeyPair,
};
use crate::database::{KvStore, PageRequest, QueryEngine, QueryResult};
use crate::privacy::types::PrivateDeposit;

/// Deposits fetched per query page during [`NoteScanner::scan_pool`]
pub const SCAN_PAGE_SIZE: u64 = 100;

/// A deposit the wallet can spend
#[derive(Debug, Clone)]
pub struct OwnedDeposit {
    pub denom: String,
    pub index: u64,
    pub amount: u64,
    pub blinding: Scalar,
    pub one_time: OneTimeAddress,
    /// x, with x·G == one_time.address
    pub one_time_private_key: Scalar,
    pub commitment: PedersenCommitment,
    pub nullifier: Nullifier,
    pub spent: bool,
}

/// Wallet note scanner
pub struct NoteScanner {
    keys: StealthKeyPair,
}

impl NoteScanner {
    pub fn new(keys: StealthKeyPair) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &StealthKeyPair {
        &self.keys
    }

    /// Owned deposits among `deposits`, in input order
    pub fn scan(&self, deposits: &[PrivateDeposit]) -> Vec<OwnedDeposit> {
        deposits
            .par_iter()
            .filter_map(|deposit| self.try_claim(deposit))
            .collect()
    }

    /// Page through every deposit of `denom`
    pub fn scan_pool<S: KvStore + ?Sized>(
        &self,
        queries: &QueryEngine<'_, S>,
        denom: &str,
    ) -> QueryResult<Vec<OwnedDeposit>> {
        let mut owned = Vec::new();
        let mut page = PageRequest::with_limit(SCAN_PAGE_SIZE);
        let mut scanned = 0usize;
        loop {
            let result = queries.deposits(denom, &page)?;
            scanned += result.deposits.len();
            owned.extend(self.scan(&result.deposits));
            match result.pagination.next_key {
                Some(key) => page = PageRequest::after_key(key, SCAN_PAGE_SIZE),
                None => break,
            }
        }
        log::debug!("Scanned {} {} deposits, {} owned", scanned, denom, owned.len());
        Ok(owned)
    }

    /// Unspent subset of a scan
    pub fn scan_unspent(&self, deposits: &[PrivateDeposit]) -> Vec<OwnedDeposit> {
        self.scan(deposits).into_iter().filter(|d| !d.spent).collect()
    }

    fn try_claim(&self, deposit: &PrivateDeposit) -> Option<OwnedDeposit> {
        let one_time = deposit.one_time_address.to_one_time().ok()?;
        let one_time_private_key = self.keys.check_if_mine(&one_time).ok()??;
        let shared_secret = compute_shared_secret(&self.keys.view_private, &one_time.tx_public_key).ok()?;

        let plaintext = match NoteEncryption::decrypt_note(
            &deposit.encrypted_note.encrypted_data,
            &deposit.encrypted_note.nonce,
            &shared_secret,
        ) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                log::warn!(
                    "Owned deposit {}/{} has an unreadable note: {}",
                    deposit.denom,
                    deposit.index,
                    e
                );
                return None;
            }
        };

        let commitment = PedersenCommitment::create(plaintext.amount, &plaintext.blinding).ok()?;
        let stored = deposit.commitment.to_point().ok()?;
        if commitment.point() != &stored {
            log::warn!(
                "Owned deposit {}/{} note does not open its commitment",
                deposit.denom,
                deposit.index
            );
            return None;
        }

        let nullifier = Nullifier::generate(&one_time_private_key, &one_time.address).ok()?;
        Some(OwnedDeposit {
            denom: deposit.denom.clone(),
            index: deposit.index,
            amount: plaintext.amount,
            blinding: plaintext.blinding,
            one_time,
            one_time_private_key,
            commitment,
            nullifier,
            spent: deposit.is_spent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::stealth::generate_stealth_address;
    use crate::crypto::curve::scalar_base_mult;
    use crate::crypto::commitments::generate_blinding;
    use crate::privacy::types::{EncryptedNoteData, OneTimeAddressData, WirePoint};

    fn deposit_for(keys: &StealthKeyPair, index: u64, amount: u64) -> PrivateDeposit {
        let out = generate_stealth_address(&keys.view_public, &keys.spend_public).unwrap();
        let blinding = generate_blinding();
        let commitment = PedersenCommitment::create(amount, &blinding).unwrap();
        let note = NoteEncryption::encrypt_note(amount, &blinding, &out.shared_secret).unwrap();
        PrivateDeposit {
            denom: "ulight".to_string(),
            index,
            commitment: WirePoint::from_point(commitment.point()).unwrap(),
            one_time_address: OneTimeAddressData::from_one_time(&out.one_time).unwrap(),
            encrypted_note: EncryptedNoteData::from_ciphertext(&note).unwrap(),
            nullifier: None,
            created_at_height: 1,
            tx_hash: String::new(),
        }
    }

    #[test]
    fn test_scan_finds_only_own_deposits() {
        let alice = StealthKeyPair::generate();
        let bob = StealthKeyPair::generate();
        let deposits = vec![
            deposit_for(&alice, 0, 10),
            deposit_for(&bob, 1, 20),
            deposit_for(&alice, 2, 30),
        ];

        let owned = NoteScanner::new(alice).scan(&deposits);
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].index, 0);
        assert_eq!(owned[0].amount, 10);
        assert_eq!(owned[1].amount, 30);
        for d in &owned {
            assert_eq!(scalar_base_mult(&d.one_time_private_key), d.one_time.address);
            assert!(d.nullifier.verify_linkage(&d.one_time.address, &d.one_time_private_key));
            assert!(!d.spent);
        }

        let bob_owned = NoteScanner::new(bob).scan(&deposits);
        assert_eq!(bob_owned.len(), 1);
        assert_eq!(bob_owned[0].amount, 20);
    }

    #[test]
    fn test_scan_rejects_mismatched_commitment() {
        let alice = StealthKeyPair::generate();
        let mut deposit = deposit_for(&alice, 0, 10);
        let other = PedersenCommitment::create(11, &generate_blinding()).unwrap();
        deposit.commitment = WirePoint::from_point(other.point()).unwrap();

        assert!(NoteScanner::new(alice).scan(&[deposit]).is_empty());
    }

    #[test]
    fn test_scan_skips_tampered_note_and_spent_filter() {
        let alice = StealthKeyPair::generate();
        let mut tampered = deposit_for(&alice, 0, 10);
        tampered.encrypted_note.encrypted_data[0] ^= 0xff;
        let mut spent = deposit_for(&alice, 1, 5);
        spent.nullifier = Some(vec![0x02; 33]);
        let fresh = deposit_for(&alice, 2, 7);

        let scanner = NoteScanner::new(alice);
        let all = scanner.scan(&[tampered, spent.clone(), fresh.clone()]);
        assert_eq!(all.len(), 2);
        assert!(all[0].spent);

        let unspent = scanner.scan_unspent(&[spent, fresh]);
        assert_eq!(unspent.len(), 1);
        assert_eq!(unspent[0].amount, 7);
    }
}
