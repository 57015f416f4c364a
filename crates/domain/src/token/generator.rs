//! Secret code generation.

use rand::RngCore;
use rand::rngs::OsRng;

use super::TokenError;

/// Random bytes in every generated secret.
pub const SECRET_BYTES: usize = 32;

/// Source of unguessable token codes.
pub trait SecretGenerator: Send + Sync {
    fn generate(&self) -> Result<String, TokenError>;
}

/// Draws secrets from the operating system CSPRNG, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngSecretGenerator;

impl SecretGenerator for OsRngSecretGenerator {
    fn generate(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Generator(e.to_string()))?;
        Ok(hex::encode(bytes))
    }
}
