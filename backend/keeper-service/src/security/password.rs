/// Password hashing and verification using Argon2id
use crate::config::PasswordHashSettings;
use crate::error::{KeeperError, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

// Verified against when the username is unknown so both login failure
// paths spend the same hashing work.
const DUMMY_PASSWORD: &str = "keeper-dummy-password";

/// Argon2id password hasher with configured cost parameters
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Build a hasher from cost settings.
    ///
    /// ## Errors
    ///
    /// Returns `KeeperError::Hashing` when the parameters are out of range.
    pub fn new(settings: PasswordHashSettings) -> Result<Self> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| KeeperError::Hashing(format!("Invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(hasher)
    }

    /// Hash a password
    ///
    /// ## Security
    ///
    /// - Algorithm: Argon2id with the configured cost
    /// - Salt: Random 16-byte salt generated per password
    ///
    /// ## Returns
    ///
    /// PHC-formatted hash string safe for database storage
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| KeeperError::Hashing(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against its hash
    ///
    /// The cost parameters embedded in the PHC string are used, so hashes
    /// created under older settings keep verifying.
    ///
    /// ## Returns
    ///
    /// `true` if password matches hash, `false` otherwise. A hash that is not
    /// a valid PHC string yields `KeeperError::MalformedHash`.
    pub fn verify(&self, password_hash: &str, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| KeeperError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(KeeperError::Hashing(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// Run a verification that always fails against an internal hash.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(&self.dummy_hash, password);
    }
}
