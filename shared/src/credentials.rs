use std::sync::Arc;

use tracing::warn;

use crate::{Agent, AdmissionError, AgentRepository, Credentials, PasswordVerifier, StoreError};

/// bcrypt-backed verifier, compatible with hashes produced by other bcrypt
/// implementations (`$2a$`, `$2b$`, `$2y$`).
#[derive(Debug, Clone)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    fn hash(&self, password: &str) -> Result<String, StoreError> {
        bcrypt::hash(password, self.cost).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[derive(Clone)]
pub struct CredentialGate {
    agents: Arc<dyn AgentRepository>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl CredentialGate {
    pub fn new(agents: Arc<dyn AgentRepository>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        Self { agents, verifier }
    }

    /// Resolves the credentials to an agent, or fails with `Unauthorized`.
    pub async fn authorize(&self, credentials: &Credentials) -> Result<Agent, AdmissionError> {
        let found = self
            .agents
            .find_by_email(&credentials.email)
            .await
            .map_err(AdmissionError::storage)?;
        let Some(agent) = found else {
            warn!(email = %credentials.email, "unknown agent");
            return Err(AdmissionError::Unauthorized);
        };

        let verifier = self.verifier.clone();
        let password = credentials.password.clone();
        let hash = agent.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
            .await
            .unwrap_or(false);

        if matches {
            Ok(agent)
        } else {
            warn!(email = %credentials.email, "password mismatch");
            Err(AdmissionError::Unauthorized)
        }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AdmissionError> {
        let verifier = self.verifier.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
            .and_then(|hashed| hashed)
            .map_err(AdmissionError::storage)
    }
}
