//! Pedersen Commitments
//!
//! `C = amount·H + blinding·G` over secp256k1. Value conservation is checked
//! on sums of commitments; amounts are never revealed.

use crate::crypto::curve::{
    generator_h, point_add, point_sub, random_scalar, scalar_base_mult, scalar_mult, EcPoint,
    Scalar, COMPRESSED_POINT_LEN,
};
use crate::crypto::{CryptoError, CryptoResult};

/// A Pedersen commitment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedersenCommitment {
    point: EcPoint,
}

/// Commitment scheme trait
pub trait CommitmentScheme {
    type Commitment;
    type BlindingFactor;
    type Value;

    /// Create a commitment
    fn commit(value: &Self::Value, blinding_factor: &Self::BlindingFactor) -> CryptoResult<Self::Commitment>;

    /// Check that a commitment opens to `(value, blinding_factor)`
    fn verify(commitment: &Self::Commitment, value: &Self::Value, blinding_factor: &Self::BlindingFactor) -> CryptoResult<bool>;

    /// Create a random blinding factor
    fn random_blinding_factor() -> Self::BlindingFactor;
}

/// Pedersen scheme over (G, H)
pub struct PedersenCommitmentScheme;

impl CommitmentScheme for PedersenCommitmentScheme {
    type Commitment = PedersenCommitment;
    type BlindingFactor = Scalar;
    type Value = u64;

    fn commit(value: &u64, blinding_factor: &Scalar) -> CryptoResult<PedersenCommitment> {
        PedersenCommitment::create(*value, blinding_factor)
    }

    fn verify(commitment: &PedersenCommitment, value: &u64, blinding_factor: &Scalar) -> CryptoResult<bool> {
        let expected = PedersenCommitment::create(*value, blinding_factor)?;
        Ok(expected == *commitment)
    }

    fn random_blinding_factor() -> Scalar {
        generate_blinding()
    }
}

impl PedersenCommitment {
    /// `amount·H + blinding·G`.
    ///
    /// A zero blinding is accepted for internally built commitments (fees);
    /// deposits must always use [`generate_blinding`].
    pub fn create(amount: u64, blinding: &Scalar) -> CryptoResult<Self> {
        let h = generator_h()?;
        let value_part = scalar_mult(&Scalar::from(amount), h);
        let blinding_part = scalar_base_mult(blinding);
        Ok(Self {
            point: point_add(&value_part, &blinding_part),
        })
    }

    /// `0·H + blinding·G`
    pub fn zero(blinding: &Scalar) -> Self {
        Self {
            point: scalar_base_mult(blinding),
        }
    }

    pub fn from_point(point: EcPoint) -> Self {
        Self { point }
    }

    pub fn point(&self) -> &EcPoint {
        &self.point
    }

    /// Structural check only: on-curve (guaranteed by [`EcPoint`]) and not the
    /// identity. Says nothing about the range of the committed amount.
    pub fn verify(&self) -> CryptoResult<()> {
        self.point
            .ensure_valid()
            .map_err(|_| CryptoError::CommitmentFailed("commitment is the identity".to_string()))
    }

    pub fn add(&self, other: &PedersenCommitment) -> PedersenCommitment {
        Self {
            point: point_add(&self.point, &other.point),
        }
    }

    pub fn sub(&self, other: &PedersenCommitment) -> PedersenCommitment {
        Self {
            point: point_sub(&self.point, &other.point),
        }
    }

    pub fn to_bytes(&self) -> CryptoResult<[u8; COMPRESSED_POINT_LEN]> {
        self.point.to_compressed()
    }

    /// Parse a compressed commitment and run [`verify`](Self::verify)
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let commitment = Self {
            point: EcPoint::from_compressed(bytes)?,
        };
        commitment.verify()?;
        Ok(commitment)
    }
}

/// Fresh uniformly random blinding factor
pub fn generate_blinding() -> Scalar {
    random_scalar()
}

fn sum(commitments: &[PedersenCommitment]) -> EcPoint {
    commitments
        .iter()
        .fold(EcPoint::identity(), |acc, c| point_add(&acc, &c.point))
}

/// `C_in == Σ C_out`
pub fn verify_balance(input: &PedersenCommitment, outputs: &[PedersenCommitment]) -> bool {
    if outputs.is_empty() {
        return false;
    }
    sum(outputs) == input.point
}

/// `C_in == Σ C_out + fee·H`
pub fn verify_balance_with_fee(
    input: &PedersenCommitment,
    outputs: &[PedersenCommitment],
    fee: u64,
) -> bool {
    verify_multi_balance(std::slice::from_ref(input), outputs, fee)
}

/// `Σ C_in == Σ C_out + fee·H`
pub fn verify_multi_balance(
    inputs: &[PedersenCommitment],
    outputs: &[PedersenCommitment],
    fee: u64,
) -> bool {
    if inputs.is_empty() || outputs.is_empty() {
        return false;
    }
    let fee_commitment = match PedersenCommitment::create(fee, &Scalar::ZERO) {
        Ok(c) => c,
        Err(_) => return false,
    };
    let rhs = point_add(&sum(outputs), &fee_commitment.point);
    sum(inputs) == rhs
}

/// `r_in == Σ r_out (mod n)`; the blinding-side half of a balanced transfer
pub fn verify_blinding_sum(input: &Scalar, outputs: &[Scalar]) -> bool {
    let total = outputs.iter().fold(Scalar::ZERO, |acc, r| acc + r);
    total == *input
}
