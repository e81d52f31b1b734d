use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};
use std::fmt;
use std::sync::OnceLock;

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Plaintext password. `Debug` is redacted so it never reaches the logs.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    /// Random alphanumeric password for accounts created without one.
    pub fn generate() -> Self {
        let password = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect();
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Hash a password using Argon2id with a fresh random salt.
pub fn hash_password(password: &Password) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

pub fn verify_password(password: &Password, password_hash: &str) -> Result<(), anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

/// Argon2 is CPU bound; hash off the async worker threads.
pub async fn hash_password_blocking(password: Password) -> Result<String, anyhow::Error> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))?
}

/// Verify off the async worker threads. A missing account is checked
/// against a throwaway hash so it costs the same as a wrong password.
pub async fn verify_password_blocking(
    password: Password,
    password_hash: Option<String>,
) -> Result<bool, anyhow::Error> {
    tokio::task::spawn_blocking(move || match password_hash {
        Some(hash) => verify_password(&password, &hash).is_ok(),
        None => {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(&password, dummy);
            }
            false
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password(&Password::generate()).ok())
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_password_correct() {
        let password = Password::new("correct horse".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&password, &hash).is_ok());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password(&Password::new("correct horse".to_string()))
            .expect("Failed to hash password");

        let wrong_password = Password::new("battery staple".to_string());
        assert!(verify_password(&wrong_password, &hash).is_err());
    }

    #[test]
    fn test_empty_hash_never_verifies() {
        assert!(verify_password(&Password::new(String::new()), "").is_err());
    }

    #[test]
    fn test_generated_passwords_differ() {
        let a = Password::generate();
        let b = Password::generate();
        assert_eq!(a.as_str().len(), GENERATED_PASSWORD_LENGTH);
        assert_ne!(a.as_str(), b.as_str());
        assert_eq!(format!("{:?}", a), "Password(***)");
    }

    #[tokio::test]
    async fn test_missing_account_never_verifies() {
        let password = Password::new("correct horse".to_string());
        assert!(!verify_password_blocking(password.clone(), None).await.unwrap());

        let hash = hash_password(&password).unwrap();
        assert!(verify_password_blocking(password, Some(hash)).await.unwrap());
        assert!(dummy_hash().is_some_and(|h| h.starts_with("$argon2")));
    }
}
