//! Signing session
//!
//! Drives one transaction through `Built -> PartiallySigned -> Complete ->
//! Finalized -> Submitted`. A session can be resumed from the hex form, so
//! each CLI invocation performs one step and hands the hex on.

use std::fmt;
use thiserror::Error;

use super::assembler::{add_signature_with_config, ensure_submittable, verify_signatures};
use super::keyset::{MultisigConfig, MultisigError};
use crate::core::{Transaction, TransactionError};
use crate::crypto::KeyPair;
use crate::network::{NetworkClient, NetworkError};

/// Errors raised while driving a signing session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transaction is finalized; no more signatures can be added")]
    AlreadyFinalized,
    #[error("Transaction must be finalized before submission")]
    NotFinalized,
    #[error("Multisig error: {0}")]
    Multisig(#[from] MultisigError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

/// Where a session is in its lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No signatures yet
    Built,
    /// Some but not all required signatures
    PartiallySigned { signed: usize, required: u16 },
    /// Enough signatures, not yet frozen
    Complete,
    /// Frozen into its final hex form
    Finalized,
    /// Accepted by the network under the given id
    Submitted(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Built => write!(f, "built"),
            SessionState::PartiallySigned { signed, required } => {
                write!(f, "partially signed ({}/{})", signed, required)
            }
            SessionState::Complete => write!(f, "complete"),
            SessionState::Finalized => write!(f, "finalized"),
            SessionState::Submitted(id) => write!(f, "submitted as {}", id),
        }
    }
}

/// A transaction collecting signatures for one M-of-N key set
#[derive(Debug, Clone)]
pub struct SigningSession {
    tx: Transaction,
    config: MultisigConfig,
    finalized: Option<String>,
    submitted: Option<String>,
}

impl SigningSession {
    /// Start a session for a freshly built transaction
    pub fn new(tx: Transaction, config: MultisigConfig) -> Self {
        Self {
            tx,
            config,
            finalized: None,
            submitted: None,
        }
    }

    /// Resume a session from the hex form produced by an earlier step.
    ///
    /// Signatures already attached must belong to `config` and verify.
    pub fn from_hex(encoded: &str, config: MultisigConfig) -> Result<Self, SessionError> {
        let tx = Transaction::from_hex(encoded)?;
        if let Some(auth) = tx.authorization() {
            if *auth.config() != config {
                return Err(MultisigError::KeySetMismatch.into());
            }
        }
        verify_signatures(&tx)?;
        Ok(Self::new(tx, config))
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn config(&self) -> &MultisigConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if let Some(id) = &self.submitted {
            return SessionState::Submitted(id.clone());
        }
        if self.finalized.is_some() {
            return SessionState::Finalized;
        }

        let signed = self.tx.signature_count();
        let required = self.config.threshold();
        if signed == 0 {
            SessionState::Built
        } else if signed < usize::from(required) {
            SessionState::PartiallySigned { signed, required }
        } else {
            SessionState::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.tx.signature_count() >= usize::from(self.config.threshold())
    }

    /// Add one signer's signature
    pub fn add_signature(&mut self, signer: &KeyPair) -> Result<SessionState, SessionError> {
        if self.finalized.is_some() {
            return Err(SessionError::AlreadyFinalized);
        }

        self.tx = add_signature_with_config(&self.tx, &self.config, signer)?;
        let state = self.state();
        log::info!("Signed by {}: {}", signer.address(), state);
        Ok(state)
    }

    /// Sign with each key pair in turn until the threshold is reached.
    ///
    /// Returns how many signatures were added.
    pub fn sign_all<'a, I>(&mut self, signers: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = &'a KeyPair>,
    {
        let mut added = 0;
        for signer in signers {
            if self.is_complete() {
                break;
            }
            self.add_signature(signer)?;
            added += 1;
        }
        Ok(added)
    }

    /// Current hex form, signed or not
    pub fn to_hex(&self) -> String {
        self.tx.to_hex()
    }

    /// Freeze the transaction and return its final hex form
    pub fn finalize(&mut self) -> Result<String, SessionError> {
        if let Some(encoded) = &self.finalized {
            return Ok(encoded.clone());
        }

        ensure_submittable(&self.tx)?;
        let encoded = self.tx.to_hex();
        log::info!(
            "Finalized transaction {} ({})",
            self.tx.id(),
            self.config.description()
        );
        self.finalized = Some(encoded.clone());
        Ok(encoded)
    }

    /// Submit the finalized transaction.
    ///
    /// On rejection the session stays finalized so submission can be retried.
    pub async fn submit(&mut self, client: &dyn NetworkClient) -> Result<String, SessionError> {
        if let Some(id) = &self.submitted {
            return Ok(id.clone());
        }
        let encoded = self.finalized.as_deref().ok_or(SessionError::NotFinalized)?;

        let id = client.submit(encoded).await?;
        log::info!("Transaction {} accepted by the network", id);
        self.submitted = Some(id.clone());
        Ok(id)
    }
}
