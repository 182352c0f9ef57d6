//! secp256k1 Curve Arithmetic
//!
//! Thin, validated wrapper over `k256` affine points. Every point that crosses
//! a trust boundary is parsed through this module, so anything that reaches the
//! commitment, stealth or nullifier engines is already known to be on the curve.

use k256::elliptic_curve::bigint::{Encoding, U256};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::DecompressPoint;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::subtle::Choice;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint};
use once_cell::sync::Lazy;

use crate::crypto::{domains, CryptoError, CryptoResult, CryptoUtils};

pub use k256::Scalar;

/// Length of a SEC1 compressed point (parity prefix + X)
pub const COMPRESSED_POINT_LEN: usize = 33;

/// Length of a SEC1 uncompressed point (0x04 + X + Y)
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Length of a single affine coordinate or scalar
pub const COORDINATE_LEN: usize = 32;

/// Upper bound on try-and-increment rounds in [`hash_to_point`]
pub const HASH_TO_POINT_ATTEMPTS: usize = 256;

/// Field prime p = 2^256 - 2^32 - 977
const FIELD_MODULUS: U256 =
    U256::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F");

/// Second Pedersen generator, independent of G.
static GENERATOR_H: Lazy<CryptoResult<EcPoint>> =
    Lazy::new(|| hash_to_point(domains::DOMAIN_H_GENERATOR));

/// A point on secp256k1. Either the identity or an affine point satisfying
/// `y^2 = x^3 + 7`; there is no way to build an off-curve value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcPoint(AffinePoint);

impl EcPoint {
    /// Base point G
    pub fn generator() -> Self {
        Self(AffinePoint::GENERATOR)
    }

    /// Point at infinity. Only ever an error sentinel.
    pub fn identity() -> Self {
        Self(AffinePoint::IDENTITY)
    }

    pub fn is_identity(&self) -> bool {
        self.0 == AffinePoint::IDENTITY
    }

    /// Gate for points supplied by an untrusted party
    pub fn ensure_valid(&self) -> CryptoResult<()> {
        if self.is_identity() {
            return Err(CryptoError::IdentityPoint);
        }
        Ok(())
    }

    pub fn as_affine(&self) -> &AffinePoint {
        &self.0
    }

    pub fn to_projective(&self) -> ProjectivePoint {
        ProjectivePoint::from(self.0)
    }

    pub fn from_projective(point: ProjectivePoint) -> Self {
        Self(point.to_affine())
    }

    /// Build a point from big-endian affine coordinates.
    ///
    /// Rejects anything that is not exactly 32 + 32 bytes or does not satisfy
    /// the curve equation.
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> CryptoResult<Self> {
        if x.len() != COORDINATE_LEN || y.len() != COORDINATE_LEN {
            return Err(CryptoError::InvalidPoint(format!(
                "coordinates must be {} bytes each, got x={} y={}",
                COORDINATE_LEN,
                x.len(),
                y.len()
            )));
        }
        let encoded = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(x),
            FieldBytes::from_slice(y),
            false,
        );
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .map(Self)
            .ok_or_else(|| CryptoError::InvalidPoint("point is not on secp256k1".to_string()))
    }

    /// Big-endian affine coordinates
    pub fn coordinates(&self) -> CryptoResult<([u8; 32], [u8; 32])> {
        let encoded = self.0.to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => {
                let mut x_bytes = [0u8; 32];
                let mut y_bytes = [0u8; 32];
                x_bytes.copy_from_slice(x);
                y_bytes.copy_from_slice(y);
                Ok((x_bytes, y_bytes))
            }
            _ => Err(CryptoError::IdentityPoint),
        }
    }

    /// SEC1 compressed encoding (33 bytes)
    pub fn to_compressed(&self) -> CryptoResult<[u8; COMPRESSED_POINT_LEN]> {
        self.ensure_valid()?;
        let encoded = self.0.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_POINT_LEN];
        out.copy_from_slice(encoded.as_bytes());
        Ok(out)
    }

    /// SEC1 uncompressed encoding (65 bytes)
    pub fn to_uncompressed(&self) -> CryptoResult<[u8; UNCOMPRESSED_POINT_LEN]> {
        self.ensure_valid()?;
        let encoded = self.0.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
        out.copy_from_slice(encoded.as_bytes());
        Ok(out)
    }

    /// Parse a 33-byte compressed point
    pub fn from_compressed(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != COMPRESSED_POINT_LEN {
            return Err(CryptoError::InvalidPoint(format!(
                "compressed point must be {} bytes, got {}",
                COMPRESSED_POINT_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(CryptoError::InvalidPoint(format!(
                "invalid compression prefix 0x{:02x}",
                bytes[0]
            )));
        }
        Self::from_sec1(bytes)
    }

    /// Parse a 65-byte uncompressed point
    pub fn from_uncompressed(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != UNCOMPRESSED_POINT_LEN || bytes[0] != 0x04 {
            return Err(CryptoError::InvalidPoint(
                "uncompressed point must be 0x04 || X || Y".to_string(),
            ));
        }
        Self::from_sec1(bytes)
    }

    fn from_sec1(bytes: &[u8]) -> CryptoResult<Self> {
        let encoded = EncodedPoint::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPoint(format!("malformed SEC1 encoding: {}", e)))?;
        let point = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| CryptoError::InvalidPoint("point is not on secp256k1".to_string()))?;
        Ok(Self(point))
    }

    pub fn negate(&self) -> Self {
        Self(-self.0)
    }
}

/// k·P
pub fn scalar_mult(k: &Scalar, point: &EcPoint) -> EcPoint {
    EcPoint::from_projective(point.to_projective() * k)
}

/// k·G
pub fn scalar_base_mult(k: &Scalar) -> EcPoint {
    EcPoint::from_projective(ProjectivePoint::GENERATOR * k)
}

/// P + Q
pub fn point_add(p: &EcPoint, q: &EcPoint) -> EcPoint {
    EcPoint::from_projective(p.to_projective() + q.to_projective())
}

/// P - Q
pub fn point_sub(p: &EcPoint, q: &EcPoint) -> EcPoint {
    EcPoint::from_projective(p.to_projective() - q.to_projective())
}

/// True if `(x, y)` are two 32-byte big-endian coordinates on the curve
pub fn is_on_curve(x: &[u8], y: &[u8]) -> bool {
    EcPoint::from_coordinates(x, y).is_ok()
}

/// The second generator `H`, derived on first use
pub fn generator_h() -> CryptoResult<&'static EcPoint> {
    GENERATOR_H.as_ref().map_err(Clone::clone)
}

/// SHA-256(data) reduced mod n
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    let digest = CryptoUtils::sha256(data);
    <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(&digest))
}

/// Try-and-increment hash onto the curve.
///
/// The candidate x starts at SHA-256(data) mod p and walks upward until
/// `x^3 + 7` is a quadratic residue; the even-y root is taken.
pub fn hash_to_point(data: &[u8]) -> CryptoResult<EcPoint> {
    let mut x = reduce_field(U256::from_be_slice(&CryptoUtils::sha256(data)));

    for _ in 0..HASH_TO_POINT_ATTEMPTS {
        let x_bytes = FieldBytes::clone_from_slice(&x.to_be_bytes());
        let candidate = AffinePoint::decompress(&x_bytes, Choice::from(0));
        if let Some(point) = Option::<AffinePoint>::from(candidate) {
            return Ok(EcPoint(point));
        }
        x = reduce_field(x.wrapping_add(&U256::ONE));
    }

    Err(CryptoError::HashToPointExhausted(HASH_TO_POINT_ATTEMPTS))
}

fn reduce_field(value: U256) -> U256 {
    if value >= FIELD_MODULUS {
        value.wrapping_sub(&FIELD_MODULUS)
    } else {
        value
    }
}

/// Uniform scalar in [1, n-1]
pub fn random_scalar() -> Scalar {
    *NonZeroScalar::random(&mut rand::thread_rng())
}

/// Big-endian 32-byte encoding of a scalar
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&scalar.to_bytes());
    out
}

/// Parse a canonical (< n) big-endian scalar
pub fn scalar_from_bytes(bytes: &[u8]) -> CryptoResult<Scalar> {
    if bytes.len() != COORDINATE_LEN {
        return Err(CryptoError::InvalidScalar(format!(
            "scalar must be {} bytes, got {}",
            COORDINATE_LEN,
            bytes.len()
        )));
    }
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
        .ok_or_else(|| CryptoError::InvalidScalar("scalar is not below the curve order".to_string()))
}

/// Parse a private key: canonical and non-zero
pub fn private_key_from_bytes(bytes: &[u8]) -> CryptoResult<Scalar> {
    let scalar = scalar_from_bytes(bytes)
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    if bool::from(scalar.is_zero()) {
        return Err(CryptoError::InvalidPrivateKey("private key is zero".to_string()));
    }
    Ok(scalar)
}
