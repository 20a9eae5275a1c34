//! Clinician accounts.
//!
//! Accounts live under their own store key and are shared by Demo and Real sessions.
//! Passwords and security answers are stored as salted PBKDF2-SHA256 hashes in the form
//! `pbkdf2-sha256$<rounds>$<salt hex>$<hash hex>`. Records written before hashing was
//! introduced hold clear text; they still verify and are rewritten hashed on the next
//! successful login or reset.

use crate::constants::{CREDENTIAL_HASH_LENGTH, CREDENTIAL_SALT_LENGTH, CREDENTIAL_SCHEME};
use crate::records::{lenient, new_record_id};
use crate::store::{load_collection, save_collection, DocumentKey, DocumentStore};
use crate::{CoreConfig, NonEmptyText, RecordError, RecordResult};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Everything needed to open an account. Every field is required.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: NonEmptyText,
    pub professional_id: NonEmptyText,
    pub specialty: NonEmptyText,
    pub password: NonEmptyText,
    pub security_question: NonEmptyText,
    pub security_answer: NonEmptyText,
}

/// Public view of an account. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicianProfile {
    pub id: String,
    pub name: String,
    pub professional_id: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredClinician {
    id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    name: String,
    professional_id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    specialty: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    password: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    security_question: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    security_answer: String,
}

impl StoredClinician {
    fn profile(&self) -> ClinicianProfile {
        ClinicianProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            professional_id: self.professional_id.clone(),
            specialty: self.specialty.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretMatch {
    Hashed,
    Legacy,
    Mismatch,
}

fn hash_secret(secret: &str, iterations: u32) -> String {
    let mut salt = [0u8; CREDENTIAL_SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; CREDENTIAL_HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, iterations, &mut hash);

    format!(
        "{CREDENTIAL_SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

fn verify_secret(secret: &str, stored: &str) -> SecretMatch {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, rounds, salt, hash] = parts.as_slice() else {
        return legacy_match(secret, stored);
    };
    if *scheme != CREDENTIAL_SCHEME {
        return legacy_match(secret, stored);
    }

    let (Ok(rounds), Ok(salt), Ok(expected)) =
        (rounds.parse::<u32>(), hex::decode(salt), hex::decode(hash))
    else {
        return SecretMatch::Mismatch;
    };
    if rounds == 0 || expected.is_empty() {
        return SecretMatch::Mismatch;
    }

    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, rounds, &mut derived);

    if bool::from(derived.as_slice().ct_eq(expected.as_slice())) {
        SecretMatch::Hashed
    } else {
        SecretMatch::Mismatch
    }
}

fn legacy_match(secret: &str, stored: &str) -> SecretMatch {
    if !stored.is_empty() && bool::from(secret.as_bytes().ct_eq(stored.as_bytes())) {
        SecretMatch::Legacy
    } else {
        SecretMatch::Mismatch
    }
}

/// Security answers compare case-insensitively, ignoring surrounding whitespace.
fn normalise_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Clinician account operations over the document store.
pub struct ClinicianDirectory {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl ClinicianDirectory {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    fn load(&self) -> RecordResult<Vec<StoredClinician>> {
        load_collection(self.store.as_ref(), DocumentKey::AuthUsers)
    }

    fn save(&self, users: &[StoredClinician]) -> RecordResult<()> {
        save_collection(self.store.as_ref(), DocumentKey::AuthUsers, users)
    }

    pub fn list(&self) -> RecordResult<Vec<ClinicianProfile>> {
        Ok(self.load()?.iter().map(StoredClinician::profile).collect())
    }

    /// Open a new account. The professional id must not already be registered.
    pub fn register(&self, registration: Registration) -> RecordResult<ClinicianProfile> {
        let mut users = self.load()?;
        let professional_id = registration.professional_id.into_string();
        if users.iter().any(|u| u.professional_id == professional_id) {
            return Err(RecordError::DuplicateProfessionalId(professional_id));
        }

        let iterations = self.cfg.credential_iterations();
        let user = StoredClinician {
            id: new_record_id(),
            name: registration.name.into_string(),
            professional_id,
            specialty: registration.specialty.into_string(),
            password: hash_secret(registration.password.as_str(), iterations),
            security_question: registration.security_question.into_string(),
            security_answer: hash_secret(
                &normalise_answer(registration.security_answer.as_str()),
                iterations,
            ),
        };
        let profile = user.profile();
        users.push(user);
        self.save(&users)?;

        tracing::info!(professional_id = %profile.professional_id, "clinician registered");
        Ok(profile)
    }

    /// Check a professional id and password.
    ///
    /// Unknown ids and wrong passwords both yield `InvalidCredentials`.
    pub fn login(&self, professional_id: &str, password: &str) -> RecordResult<ClinicianProfile> {
        let professional_id = professional_id.trim();
        if password.is_empty() {
            return Err(RecordError::InvalidCredentials);
        }

        let mut users = self.load()?;
        let Some(index) = users
            .iter()
            .position(|u| u.professional_id == professional_id)
        else {
            return Err(RecordError::InvalidCredentials);
        };

        let outcome = verify_secret(password, &users[index].password);
        if outcome == SecretMatch::Mismatch {
            return Err(RecordError::InvalidCredentials);
        }

        let profile = users[index].profile();
        if outcome == SecretMatch::Legacy {
            self.upgrade_legacy(&mut users, index, password);
        }
        Ok(profile)
    }

    /// Rewrite clear-text credentials of `users[index]` as hashes.
    fn upgrade_legacy(&self, users: &mut [StoredClinician], index: usize, password: &str) {
        let iterations = self.cfg.credential_iterations();
        let user = &mut users[index];
        user.password = hash_secret(password, iterations);
        if !user.security_answer.is_empty() && !user.security_answer.starts_with(CREDENTIAL_SCHEME)
        {
            user.security_answer =
                hash_secret(&normalise_answer(&user.security_answer), iterations);
        }

        if let Err(e) = self.save(users) {
            tracing::warn!("could not rewrite legacy credentials: {}", e);
        }
    }

    /// Recovery question for an account.
    pub fn security_question(&self, professional_id: &str) -> RecordResult<String> {
        let professional_id = professional_id.trim();
        self.load()?
            .into_iter()
            .find(|u| u.professional_id == professional_id)
            .map(|u| u.security_question)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| RecordError::UnknownClinician(professional_id.to_string()))
    }

    /// Replace the password after a correct security answer.
    pub fn reset_password(
        &self,
        professional_id: &str,
        answer: &str,
        new_password: NonEmptyText,
    ) -> RecordResult<()> {
        let professional_id = professional_id.trim();
        let mut users = self.load()?;
        let user = users
            .iter_mut()
            .find(|u| u.professional_id == professional_id)
            .filter(|u| !u.security_question.trim().is_empty())
            .ok_or_else(|| RecordError::UnknownClinician(professional_id.to_string()))?;

        let answer = normalise_answer(answer);
        if verify_secret(&answer, &user.security_answer) == SecretMatch::Mismatch {
            return Err(RecordError::SecurityAnswerMismatch);
        }

        let iterations = self.cfg.credential_iterations();
        user.password = hash_secret(new_password.as_str(), iterations);
        user.security_answer = hash_secret(&answer, iterations);
        self.save(&users)?;

        tracing::info!(professional_id = %professional_id, "password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::path::PathBuf;

    const TEST_ROUNDS: u32 = 1_000;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn directory(store: Arc<MemoryStore>) -> ClinicianDirectory {
        let cfg = CoreConfig::new(PathBuf::from("unused"), text("v-test"), TEST_ROUNDS)
            .expect("config should be valid");
        ClinicianDirectory::new(Arc::new(cfg), store)
    }

    fn registration(professional_id: &str) -> Registration {
        Registration {
            name: text("Manuel García"),
            professional_id: text(professional_id),
            specialty: text("Traumatología"),
            password: text("rodilla-2024"),
            security_question: text("Nombre de tu primera mascota"),
            security_answer: text("  Toby "),
        }
    }

    #[test]
    fn test_register_then_login() {
        let store = Arc::new(MemoryStore::new());
        let directory = directory(store.clone());

        let profile = directory.register(registration("COL-123")).unwrap();
        let logged_in = directory.login("COL-123", "rodilla-2024").unwrap();

        assert_eq!(profile, logged_in);
        assert_eq!(logged_in.specialty, "Traumatología");
    }

    #[test]
    fn test_credentials_are_not_stored_in_clear() {
        let store = Arc::new(MemoryStore::new());
        let directory = directory(store.clone());
        directory.register(registration("COL-123")).unwrap();

        let raw = store.raw(DocumentKey::AuthUsers).unwrap();
        assert!(!raw.contains("rodilla-2024"));
        assert!(!raw.contains("toby"));
        assert!(raw.contains(CREDENTIAL_SCHEME));
    }

    #[test]
    fn test_duplicate_professional_id_is_rejected() {
        let directory = directory(Arc::new(MemoryStore::new()));
        directory.register(registration("COL-123")).unwrap();

        let err = directory
            .register(registration("COL-123"))
            .expect_err("second registration should fail");
        assert!(matches!(err, RecordError::DuplicateProfessionalId(_)));
        assert_eq!(directory.list().unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_password_and_unknown_id_look_the_same() {
        let directory = directory(Arc::new(MemoryStore::new()));
        directory.register(registration("COL-123")).unwrap();

        assert!(matches!(
            directory.login("COL-123", "wrong"),
            Err(RecordError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.login("COL-999", "rodilla-2024"),
            Err(RecordError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_password_with_normalised_answer() {
        let directory = directory(Arc::new(MemoryStore::new()));
        directory.register(registration("COL-123")).unwrap();

        assert_eq!(
            directory.security_question("COL-123").unwrap(),
            "Nombre de tu primera mascota"
        );
        directory
            .reset_password("COL-123", "TOBY", text("tobillo-2025"))
            .unwrap();

        assert!(directory.login("COL-123", "rodilla-2024").is_err());
        assert!(directory.login("COL-123", "tobillo-2025").is_ok());
    }

    #[test]
    fn test_reset_password_rejects_wrong_answer() {
        let directory = directory(Arc::new(MemoryStore::new()));
        directory.register(registration("COL-123")).unwrap();

        let err = directory
            .reset_password("COL-123", "Rex", text("nueva"))
            .expect_err("wrong answer should fail");
        assert!(matches!(err, RecordError::SecurityAnswerMismatch));
        assert!(directory.login("COL-123", "rodilla-2024").is_ok());
    }

    #[test]
    fn test_unknown_clinician_has_no_question() {
        let directory = directory(Arc::new(MemoryStore::new()));
        assert!(matches!(
            directory.security_question("nobody"),
            Err(RecordError::UnknownClinician(_))
        ));
    }

    #[test]
    fn test_null_profile_fields_do_not_drop_the_account() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                DocumentKey::AuthUsers,
                &json!([{
                    "id": "u1",
                    "name": "Laura",
                    "professionalId": "12345678Z",
                    "specialty": null,
                    "password": "secreta",
                    "securityQuestion": null,
                    "securityAnswer": null
                }]),
            )
            .unwrap();
        let directory = directory(store);

        let profile = directory.login("12345678Z", "secreta").unwrap();
        assert_eq!(profile.specialty, "");
        assert_eq!(directory.list().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_clear_text_account_is_upgraded_on_login() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                DocumentKey::AuthUsers,
                &json!([{
                    "id": "u1",
                    "name": "Laura",
                    "professionalId": "12345678Z",
                    "specialty": "Neurología",
                    "password": "secreta",
                    "securityQuestion": "Ciudad natal",
                    "securityAnswer": "sevilla"
                }]),
            )
            .unwrap();
        let directory = directory(store.clone());

        directory.login("12345678Z", "secreta").unwrap();

        let raw = store.raw(DocumentKey::AuthUsers).unwrap();
        assert!(!raw.contains("secreta"));
        assert!(!raw.contains("\"sevilla\""));
        assert!(directory.login("12345678Z", "secreta").is_ok());
        directory
            .reset_password("12345678Z", " Sevilla ", text("otra"))
            .unwrap();
        assert!(directory.login("12345678Z", "otra").is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_hash() {
        let stored = hash_secret("clave", TEST_ROUNDS);
        assert_eq!(verify_secret("clave", &stored), SecretMatch::Hashed);
        assert_eq!(verify_secret("Clave", &stored), SecretMatch::Mismatch);

        let tampered = stored.replace(&format!("${TEST_ROUNDS}$"), "$1$");
        assert_eq!(verify_secret("clave", &tampered), SecretMatch::Mismatch);
    }
}
