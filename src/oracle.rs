// 2.0 oracle.rs: signed price gate. every priced call carries (timestamp, price, signature)
// signed off-chain by the registered oracle key over (symbol, timestamp, price).
//
// digest layout matches solidity abi.encodePacked(string, uint256, uint256) wrapped in the
// "\x19Ethereum Signed Message:\n32" prefix, so feeds signed with standard wallet tooling verify here.

use crate::types::{keccak256, Address, Fixed, Timestamp};
use ethnum::I256;
use libsecp256k1::{Message, PublicKey, RecoveryId, SecretKey, Signature};
use serde::{Deserialize, Serialize};

const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Recoverable secp256k1 signature in (v, r, s) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSignature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// A price as delivered by the oracle, ready to be attached to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPrice {
    pub timestamp: Timestamp,
    pub price: Fixed,
    pub signature: OracleSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Fixed),

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature recovers {recovered}, expected oracle {expected}")]
    WrongSigner { recovered: Address, expected: Address },

    #[error("price at {timestamp} is outside the {allowance}s window around {now}")]
    Stale {
        timestamp: Timestamp,
        now: Timestamp,
        allowance: u64,
    },

    #[error("invalid oracle key")]
    InvalidKey,
}

fn u256_word(value: I256) -> [u8; 32] {
    value.to_be_bytes()
}

/// keccak256(symbol ‖ uint256(timestamp) ‖ uint256(price)).
pub fn price_digest(symbol: &str, timestamp: Timestamp, price: Fixed) -> [u8; 32] {
    let mut packed = Vec::with_capacity(symbol.len() + 64);
    packed.extend_from_slice(symbol.as_bytes());
    packed.extend_from_slice(&u256_word(I256::from(timestamp.as_secs())));
    packed.extend_from_slice(&u256_word(price.raw()));
    keccak256(&packed)
}

pub fn signed_message_digest(digest: &[u8; 32]) -> [u8; 32] {
    let mut prefixed = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + 32);
    prefixed.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    prefixed.extend_from_slice(digest);
    keccak256(&prefixed)
}

pub fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize();
    Address::from_hash(&keccak256(&uncompressed[1..]))
}

/// Recovers the address that signed `(symbol, timestamp, price)`.
pub fn recover_signer(
    symbol: &str,
    timestamp: Timestamp,
    price: Fixed,
    signature: &OracleSignature,
) -> Result<Address, OracleError> {
    let digest = signed_message_digest(&price_digest(symbol, timestamp, price));
    let message = Message::parse(&digest);

    let recovery = match signature.v {
        27 | 28 => signature.v - 27,
        0 | 1 => signature.v,
        _ => return Err(OracleError::MalformedSignature),
    };
    let recovery_id = RecoveryId::parse(recovery).map_err(|_| OracleError::MalformedSignature)?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);
    let sig = Signature::parse_standard(&compact).map_err(|_| OracleError::MalformedSignature)?;

    let public_key =
        libsecp256k1::recover(&message, &sig, &recovery_id).map_err(|_| OracleError::MalformedSignature)?;
    Ok(address_of(&public_key))
}

/// Verifies signed prices for one symbol against one registered signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleVerifier {
    symbol: String,
    signer: Address,
    delay_allowance: u64,
}

impl OracleVerifier {
    pub fn new(symbol: impl Into<String>, signer: Address, delay_allowance: u64) -> Self {
        Self {
            symbol: symbol.into(),
            signer,
            delay_allowance,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn delay_allowance(&self) -> u64 {
        self.delay_allowance
    }

    /// Returns the verified price. the window is symmetric: a future timestamp is
    /// accepted only within the same allowance.
    pub fn verify(&self, signed: &SignedPrice, now: Timestamp) -> Result<Fixed, OracleError> {
        if !signed.price.is_positive() {
            return Err(OracleError::NonPositivePrice(signed.price));
        }

        let recovered = recover_signer(&self.symbol, signed.timestamp, signed.price, &signed.signature)?;
        if recovered != self.signer {
            return Err(OracleError::WrongSigner {
                recovered,
                expected: self.signer,
            });
        }

        if signed.timestamp.distance(now) > self.delay_allowance {
            return Err(OracleError::Stale {
                timestamp: signed.timestamp,
                now,
                allowance: self.delay_allowance,
            });
        }

        Ok(signed.price)
    }
}

/// Off-chain side of the feed. signs prices the way the oracle service does.
#[derive(Clone)]
pub struct OracleSigner {
    secret: SecretKey,
    address: Address,
}

impl std::fmt::Debug for OracleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSigner").field("address", &self.address).finish()
    }
}

impl OracleSigner {
    pub fn from_secret(secret: &[u8; 32]) -> Result<Self, OracleError> {
        let secret = SecretKey::parse(secret).map_err(|_| OracleError::InvalidKey)?;
        let address = address_of(&PublicKey::from_secret_key(&secret));
        Ok(Self { secret, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign(&self, symbol: &str, timestamp: Timestamp, price: Fixed) -> SignedPrice {
        let digest = signed_message_digest(&price_digest(symbol, timestamp, price));
        let (sig, recovery_id) = libsecp256k1::sign(&Message::parse(&digest), &self.secret);
        let compact = sig.serialize();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        SignedPrice {
            timestamp,
            price,
            signature: OracleSignature {
                v: recovery_id.serialize() + 27,
                r,
                s,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYMBOL: &str = "BTCUSD";

    fn signer() -> OracleSigner {
        OracleSigner::from_secret(&[0x42; 32]).unwrap()
    }

    fn verifier() -> OracleVerifier {
        OracleVerifier::new(SYMBOL, signer().address(), 100)
    }

    #[test]
    fn accepts_fresh_signed_price() {
        let signed = signer().sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        let price = verifier().verify(&signed, Timestamp::from_secs(1_050)).unwrap();
        assert_eq!(price, Fixed::from_int(10_000));
    }

    #[test]
    fn staleness_window_is_inclusive() {
        let signed = signer().sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        assert!(verifier().verify(&signed, Timestamp::from_secs(1_100)).is_ok());
        assert!(matches!(
            verifier().verify(&signed, Timestamp::from_secs(1_101)),
            Err(OracleError::Stale { .. })
        ));
    }

    #[test]
    fn future_price_limited_by_same_window() {
        let signed = signer().sign(SYMBOL, Timestamp::from_secs(1_100), Fixed::from_int(10_000));
        assert!(verifier().verify(&signed, Timestamp::from_secs(1_000)).is_ok());
        assert!(verifier().verify(&signed, Timestamp::from_secs(999)).is_err());
    }

    #[test]
    fn tampered_price_recovers_other_signer() {
        let mut signed = signer().sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        signed.price = Fixed::from_int(9_000);
        assert!(matches!(
            verifier().verify(&signed, Timestamp::from_secs(1_000)),
            Err(OracleError::WrongSigner { .. }) | Err(OracleError::MalformedSignature)
        ));
    }

    #[test]
    fn other_symbol_rejected() {
        let signed = signer().sign("ETHUSD", Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        assert!(verifier().verify(&signed, Timestamp::from_secs(1_000)).is_err());
    }

    #[test]
    fn unregistered_signer_rejected() {
        let rogue = OracleSigner::from_secret(&[0x07; 32]).unwrap();
        let signed = rogue.sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        let err = verifier().verify(&signed, Timestamp::from_secs(1_000)).unwrap_err();
        assert_eq!(
            err,
            OracleError::WrongSigner {
                recovered: rogue.address(),
                expected: signer().address()
            }
        );
    }

    #[test]
    fn bad_recovery_byte_is_malformed() {
        let mut signed = signer().sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::from_int(10_000));
        signed.signature.v = 35;
        assert_eq!(
            verifier().verify(&signed, Timestamp::from_secs(1_000)),
            Err(OracleError::MalformedSignature)
        );
    }

    #[test]
    fn zero_price_rejected() {
        let signed = signer().sign(SYMBOL, Timestamp::from_secs(1_000), Fixed::ZERO);
        assert!(matches!(
            verifier().verify(&signed, Timestamp::from_secs(1_000)),
            Err(OracleError::NonPositivePrice(_))
        ));
    }
}
