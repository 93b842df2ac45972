use rocket::tokio::task;

/// Work factor for new hashes.
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password worker stopped: {0}")]
    Join(#[from] task::JoinError),
}

/// bcrypt is CPU bound, so both operations run on the blocking pool.
pub struct PasswordService;

impl PasswordService {
    pub async fn hash(password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let hashed = task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??;
        Ok(hashed)
    }

    pub async fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let ok = task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn hashes_verify() {
        let hash = PasswordService::hash("Admin@123456").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(PasswordService::verify("Admin@123456", &hash).await.unwrap());
        assert!(!PasswordService::verify("admin@123456", &hash).await.unwrap());
    }
}
