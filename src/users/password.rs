use anyhow::Context;

/// Bcrypt cost factor for password hashing.
pub const BCRYPT_COST: u32 = 12;

/// Hash a password with bcrypt. Runs on the blocking thread pool so the
/// hashing computation never stalls in-flight requests.
pub async fn hash_password(plain: &str, cost: Option<u32>) -> anyhow::Result<String> {
    let plain = plain.to_owned();
    let cost = cost.unwrap_or(BCRYPT_COST);
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .context("bcrypt hash task")??;
    Ok(hash)
}

/// Compare a candidate plaintext against a stored hash.
pub async fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .context("bcrypt verify task")??;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast; production always uses BCRYPT_COST.
    const TEST_COST: Option<u32> = Some(4);

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, TEST_COST).await.expect("hash");
        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, TEST_COST).await.expect("hash");
        assert!(!verify_password("wrong-password", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let password = "same-input-twice";
        let a = hash_password(password, TEST_COST).await.expect("hash");
        let b = hash_password(password, TEST_COST).await.expect("hash");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn verify_errors_on_malformed_hash() {
        assert!(verify_password("anything", "not-a-valid-hash").await.is_err());
    }
}
