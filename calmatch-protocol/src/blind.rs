//! Point blinding for the set intersection rounds.
//!
//! An event uid is mapped deterministically onto the Ristretto group, then
//! blinded by multiplying with a party's secret scalar. Blinding commutes:
//! `b * (a * H(x)) == a * (b * H(x))`, so two parties that each blind the
//! same uid once end up with equal double-blinded points, which is the whole
//! intersection test.

use crate::error::{CalMatchError, Result};
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::Scalar;
use sha2::Sha512;

/// Map an event uid to a curve point.
///
/// Uses the Ristretto hash-to-point construction, so the result has no known
/// discrete log and the same uid maps to the same point in every process.
pub fn map_to_point(uid: &str) -> RistrettoPoint {
    RistrettoPoint::hash_from_bytes::<Sha512>(uid.as_bytes())
}

/// Multiply a point by a secret scalar.
///
/// Used both for first-blinding a mapped uid and for second-blinding a value
/// already blinded by the peer.
pub fn blind(point: &RistrettoPoint, secret: &Scalar) -> CompressedRistretto {
    (secret * point).compress()
}

/// First-blind a uid: `blind(map_to_point(uid), secret)`.
pub fn blind_identifier(uid: &str, secret: &Scalar) -> CompressedRistretto {
    blind(&map_to_point(uid), secret)
}

/// Hex-encode a compressed point for the wire.
pub fn encode_point(point: &CompressedRistretto) -> String {
    hex::encode(point.to_bytes())
}

/// Decode a hex-encoded compressed point and check it lies on the curve.
///
/// # Errors
/// `InvalidPoint` if the encoding is not valid hex, not 32 bytes, or does not
/// decompress to a curve point.
pub fn decode_point(point_hex: &str) -> Result<RistrettoPoint> {
    let bytes =
        hex::decode(point_hex).map_err(|e| CalMatchError::InvalidPoint(e.to_string()))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CalMatchError::InvalidPoint("expected 32-byte point".to_string()))?;
    CompressedRistretto(array)
        .decompress()
        .ok_or_else(|| CalMatchError::InvalidPoint("point decompression failed".to_string()))
}

/// Second-blind a batch of received hex-encoded points, preserving order.
///
/// Order matters: the intersection maps matched positions back to events by
/// index, so the output is positionally aligned with the input.
pub fn blind_received(points_hex: &[String], secret: &Scalar) -> Result<Vec<String>> {
    points_hex
        .iter()
        .map(|p| {
            let point = decode_point(p)?;
            Ok(encode_point(&blind(&point, secret)))
        })
        .collect()
}
