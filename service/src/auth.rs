//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Credential checking
//!
//! The connection captures a login and a password and hands both to an [`Authenticator`].
//! Any `Fn(&[u8], &[u8]) -> AuthOutcome` closure is an authenticator. [`UserTable`] is a
//! ready-made one backed by crypt-style password hashes computed by a [`PasswordHasher`].

use rand::Rng;

/// Alphabet of crypt(3) salts
pub const CRYPT_SALT_ALPHABET: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Hashed for unknown logins when the table has no entry to hash against
const DECOY_SETTINGS: &str = "$6$telconunknownuser";

/// Result of a credential check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted
    Success,
    /// Credentials rejected
    Failure,
    /// The check itself failed, for example because the user is unknown.
    ///
    /// Clients are told exactly what they are told on [`AuthOutcome::Failure`].
    Error,
}

impl AuthOutcome {
    /// Check if access is granted
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Decides whether a login and password pair grants access.
pub trait Authenticator: Send + Sync {
    /// Checks the credentials. Neither slice contains the line terminator.
    fn check(&self, login: &[u8], password: &[u8]) -> AuthOutcome;
}

impl<F> Authenticator for F
where
    F: Fn(&[u8], &[u8]) -> AuthOutcome + Send + Sync,
{
    fn check(&self, login: &[u8], password: &[u8]) -> AuthOutcome {
        self(login, password)
    }
}

/// A crypt(3) style password hash function such as SHA-512-crypt.
///
/// `settings` is either a fresh `$<id>$<salt>` string or a complete stored hash, from which
/// the implementation takes the algorithm and salt.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` with the algorithm and salt named in `settings`.
    fn hash(&self, password: &[u8], settings: &str) -> String;

    /// Checks `password` against a stored hash. The default compares in constant time.
    fn verify(&self, password: &[u8], stored: &str) -> bool {
        constant_time_eq(self.hash(password, stored).as_bytes(), stored.as_bytes())
    }
}

/// A fixed table of users and their password hashes.
///
/// # Example
///
/// ```
/// use telcon_service::{AuthOutcome, Authenticator, PasswordHasher, UserTable};
///
/// struct Reversed;
///
/// impl PasswordHasher for Reversed {
///     fn hash(&self, password: &[u8], _settings: &str) -> String {
///         password.iter().rev().map(|b| *b as char).collect()
///     }
/// }
///
/// let table = UserTable::new(Reversed).with_user("bob", "terces");
/// assert_eq!(table.check(b"bob", b"secret"), AuthOutcome::Success);
/// assert_eq!(table.check(b"bob", b"guess"), AuthOutcome::Failure);
/// assert_eq!(table.check(b"eve", b"secret"), AuthOutcome::Error);
/// ```
///
/// An unknown login still costs one hash, so response timing does not reveal which logins
/// exist.
pub struct UserTable<H> {
    users: Vec<(Vec<u8>, String)>,
    hasher: H,
}

impl<H: PasswordHasher> UserTable<H> {
    /// Create an empty table using `hasher` for verification
    pub fn new(hasher: H) -> Self {
        Self {
            users: Vec::new(),
            hasher,
        }
    }

    /// Add a user with a stored password hash
    pub fn with_user(mut self, login: impl Into<Vec<u8>>, stored_hash: impl Into<String>) -> Self {
        self.add_user(login, stored_hash);
        self
    }

    /// Add a user with a stored password hash, replacing an existing entry of the same name
    pub fn add_user(&mut self, login: impl Into<Vec<u8>>, stored_hash: impl Into<String>) {
        let login = login.into();
        let stored_hash = stored_hash.into();
        match self.users.iter_mut().find(|(name, _)| *name == login) {
            Some(entry) => entry.1 = stored_hash,
            None => self.users.push((login, stored_hash)),
        }
    }

    /// Number of users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the table has no users
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Hashes `password` for storage with a freshly generated `$<id>$<salt>` setting.
    pub fn hash_password(&self, id: &str, password: &[u8]) -> String {
        self.hasher.hash(password, &crypt_settings(id, 16))
    }
}

impl<H: PasswordHasher> Authenticator for UserTable<H> {
    fn check(&self, login: &[u8], password: &[u8]) -> AuthOutcome {
        match self.users.iter().find(|(name, _)| name.as_slice() == login) {
            Some((_, stored)) if self.hasher.verify(password, stored) => AuthOutcome::Success,
            Some(_) => AuthOutcome::Failure,
            None => {
                let decoy = self
                    .users
                    .first()
                    .map_or(DECOY_SETTINGS, |(_, stored)| stored.as_str());
                let _ = self.hasher.verify(password, decoy);
                AuthOutcome::Error
            }
        }
    }
}

impl<H> std::fmt::Debug for UserTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserTable")
            .field("users", &self.users.len())
            .finish_non_exhaustive()
    }
}

/// Compares two byte strings without stopping at the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Generates a random crypt salt of `len` characters.
pub fn generate_salt(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(CRYPT_SALT_ALPHABET[rng.random_range(0..CRYPT_SALT_ALPHABET.len())]))
        .collect()
}

/// Builds a `$<id>$<salt>` settings string with a fresh salt, `$6$...` for SHA-512-crypt.
pub fn crypt_settings(id: &str, salt_len: usize) -> String {
    format!("${id}${}", generate_salt(salt_len))
}
