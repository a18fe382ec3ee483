//! Multi-signature transaction support
//!
//! M-of-N threshold authorization for global-parameter transactions: M
//! signatures from N authorized admins are required before a transaction
//! can be submitted.
//!
//! # Example
//!
//! ```ignore
//! use globalparam::core::build_snapshot_request;
//! use globalparam::multisig::{MultisigConfig, SigningSession};
//!
//! // 2-of-3 admin key set
//! let config = MultisigConfig::new(2, vec![pubkey1, pubkey2, pubkey3])?;
//! let mut session = SigningSession::new(build_snapshot_request(500, 20000)?, config);
//!
//! // Collect signatures (possibly across separate runs via `to_hex` / `from_hex`)
//! session.add_signature(&admin1)?;
//! session.add_signature(&admin3)?;
//!
//! // Freeze and submit
//! session.finalize()?;
//! let id = session.submit(&client).await?;
//! ```

pub mod assembler;
pub mod authorization;
pub mod keyset;
pub mod session;

pub use assembler::{
    add_signature, add_signature_with_config, ensure_submittable, is_complete, verify_signatures,
};
pub use authorization::{Authorization, SlotSignature};
pub use keyset::{default_threshold, parse_public_keys, MultisigConfig, MultisigError, MAX_SIGNERS};
pub use session::{SessionError, SessionState, SigningSession};
