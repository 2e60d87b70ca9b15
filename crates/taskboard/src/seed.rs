//! Demo accounts for a fresh install.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::auth::PasswordHasher;
use crate::models::NewUser;
use crate::storage::Storage;

/// `(name, email, password)` of the demo accounts.
pub const DEMO_USERS: &[(&str, &str, &str)] = &[
    ("Admin", "admin@example.com", "admin123"),
    ("Budi", "budi@example.com", "password"),
    ("Siti", "siti@example.com", "password"),
];

/// Insert the demo accounts, skipping any whose email is taken.
/// Returns how many were created.
pub async fn seed_demo_users(storage: &dyn Storage, hasher: &PasswordHasher) -> Result<usize> {
    let mut created = 0;
    for &(name, email, password) in DEMO_USERS {
        if storage
            .find_user_by_email(email)
            .await
            .with_context(|| format!("Failed to look up {email}"))?
            .is_some()
        {
            debug!(email, "Demo user already present");
            continue;
        }

        let password_hash = hasher
            .hash(password.to_string())
            .await
            .context("Failed to hash demo password")?;
        storage
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .with_context(|| format!("Failed to create {email}"))?;
        created += 1;
    }

    info!(created, backend = storage.backend(), "Demo users seeded");
    Ok(created)
}
