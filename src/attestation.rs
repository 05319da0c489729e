// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Oracle attestations over numeric values.
//!
//! An oracle with long-term key `A = a·G` pre-publishes a commitment point
//! `R = k·G` for a one-time nonce `k`. Once the observed value `v` is known
//! it publishes the scalar `s = k − e·a`, where `e = SHA256(m || x(R))` and
//! `m` is the 32-byte encoding of `v` (see [`value_message`]). Anybody knowing
//! `A` and `R` can check the attestation with `s·G == R − e·A` without
//! learning `k` in advance.
//!
//! All verification functions return `false` on malformed input: wrong
//! lengths, points not on the curve and out-of-range scalars are expected
//! adversarial input, not program faults.

use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::{PublicKey, Scalar, SecretKey};

use crate::{Error, SECP256K1};

/// Value reported by an oracle
pub type OracleValue = i64;

/// Length of the serialized compressed secp256k1 point
pub const POINT_LEN: usize = 33;
/// Length of the signed value message
pub const MESSAGE_LEN: usize = 32;
/// Length of the attestation scalar
pub const SIGNATURE_LEN: usize = 32;

/// Attestation scalar `s` published by an oracle for some value
#[derive(Wrapper, Copy, Clone, PartialEq, Eq, Hash, Debug, From)]
#[wrapper(Deref, BorrowSlice)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct OracleSignature(#[from] [u8; SIGNATURE_LEN]);

impl OracleSignature {
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let mut inner = [0u8; SIGNATURE_LEN];
        if slice.len() != SIGNATURE_LEN {
            return None;
        }
        inner.copy_from_slice(slice);
        Some(OracleSignature(inner))
    }
}

impl fmt::Display for OracleSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display("oracle signature must be a 64-character hex string, got `{0}`")]
pub struct SignatureParseError(String);

impl FromStr for OracleSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SignatureParseError(s.to_owned());
        if s.len() != SIGNATURE_LEN * 2 || !s.is_ascii() {
            return Err(err());
        }
        let mut inner = [0u8; SIGNATURE_LEN];
        for (pos, byte) in inner.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[pos * 2..pos * 2 + 2], 16).map_err(|_| err())?;
        }
        Ok(OracleSignature(inner))
    }
}

/// Parses 33-byte compressed secp256k1 point; uncompressed encodings are
/// rejected.
pub fn parse_compressed_point(bytes: &[u8]) -> Result<PublicKey, Error> {
    if bytes.len() != POINT_LEN {
        return Err(Error::InvalidKey);
    }
    PublicKey::from_slice(bytes).map_err(|_| Error::InvalidKey)
}

/// Message signed by the oracle for a value: 24 zero bytes followed by the
/// 8-byte big-endian two's complement representation of the value. Negative
/// values are not sign-extended into the padding.
pub fn value_message(value: OracleValue) -> [u8; MESSAGE_LEN] {
    let mut message = [0u8; MESSAGE_LEN];
    message[MESSAGE_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    message
}

/// Challenge `e = SHA256(m || x(R))`. Returns `None` if the hash does not fit
/// into the curve order or is zero.
fn challenge(message: &[u8; MESSAGE_LEN], commitment_point: &PublicKey) -> Option<Scalar> {
    let mut engine = sha256::Hash::engine();
    engine.input(message);
    engine.input(&commitment_point.serialize()[1..]);
    let e = sha256::Hash::from_engine(engine).to_byte_array();
    match Scalar::from_be_bytes(e) {
        Ok(scalar) if scalar != Scalar::ZERO => Some(scalar),
        _ => None,
    }
}

fn signature_point_for(
    oracle_key: &PublicKey,
    commitment_point: &PublicKey,
    message: &[u8; MESSAGE_LEN],
) -> Option<PublicKey> {
    let e = challenge(message, commitment_point)?;
    let ea = oracle_key.mul_tweak(&SECP256K1, &e).ok()?;
    commitment_point.combine(&ea.negate(&SECP256K1)).ok()
}

/// Computes point `s·G = R − e·A` the attestation for `value` must match.
/// Knowing this point before the attestation is published allows building
/// settlement transactions in advance.
pub fn signature_point(
    oracle_key: &PublicKey,
    commitment_point: &PublicKey,
    value: OracleValue,
) -> Option<PublicKey> {
    signature_point_for(oracle_key, commitment_point, &value_message(value))
}

/// Checks that `signature` attests `value` under oracle key and commitment
/// point.
pub fn verify(
    oracle_key: &PublicKey,
    commitment_point: &PublicKey,
    value: OracleValue,
    signature: &[u8],
) -> bool {
    verify_message(oracle_key, commitment_point, &value_message(value), signature)
}

/// Same as [`verify`], but operating on raw serialized data as it comes from
/// the wire.
pub fn verify_raw(oracle_key: &[u8], commitment_point: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let (oracle_key, commitment_point) = match (
        parse_compressed_point(oracle_key),
        parse_compressed_point(commitment_point),
    ) {
        (Ok(a), Ok(r)) => (a, r),
        _ => return false,
    };
    let mut msg = [0u8; MESSAGE_LEN];
    if message.len() != MESSAGE_LEN {
        return false;
    }
    msg.copy_from_slice(message);
    verify_message(&oracle_key, &commitment_point, &msg, signature)
}

fn verify_message(
    oracle_key: &PublicKey,
    commitment_point: &PublicKey,
    message: &[u8; MESSAGE_LEN],
    signature: &[u8],
) -> bool {
    if signature.len() != SIGNATURE_LEN {
        return false;
    }
    // Zero and values above the curve order are rejected here
    let s = match SecretKey::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    match signature_point_for(oracle_key, commitment_point, message) {
        Some(expected) => PublicKey::from_secret_key(&SECP256K1, &s) == expected,
        None => false,
    }
}

/// Oracle side of the scheme: produces attestation `s = k − e·a` for `value`
/// using the oracle secret `a` and the nonce `k` whose point `R = k·G` was
/// published before.
///
/// # Security
///
/// Nonce must never be reused for a different value: two attestations with
/// the same nonce reveal the oracle secret key.
pub fn attest(oracle_secret: &SecretKey, nonce: &SecretKey, value: OracleValue) -> Option<OracleSignature> {
    let commitment_point = PublicKey::from_secret_key(&SECP256K1, nonce);
    let e = challenge(&value_message(value), &commitment_point)?;
    let ea = oracle_secret.mul_tweak(&e).ok()?;
    let s = nonce.add_tweak(&Scalar::from(ea.negate())).ok()?;
    Some(OracleSignature(s.secret_bytes()))
}
