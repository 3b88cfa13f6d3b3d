//! Validated identifiers for accounts and the identities they log in with.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (account, identity).
		kind: &'static str,
	},
}

def_id! { AccountId, "Unique identifier of an internal account (the provider subject for federated accounts).", "Account" }
def_id! { AccountIdentity, "Login identity of an account, normally an email address.", "Identity" }

// Provider subjects and emails are opaque; only presence is required.
fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_empty_identifiers_are_rejected() {
		assert!(matches!(AccountId::new(""), Err(IdentifierError::Empty { kind: "Account" })));
		assert!(matches!(
			AccountIdentity::new(""),
			Err(IdentifierError::Empty { kind: "Identity" })
		));

		let identity = AccountIdentity::new("admin@example.com")
			.expect("Identity fixture should be considered valid.");

		assert_eq!(identity.as_ref(), "admin@example.com");
		assert!(AccountId::new("with space").is_ok());
	}

	#[test]
	fn long_email_identity_is_accepted() {
		let email = format!("{}@example.com", "a".repeat(240));
		let identity = AccountIdentity::new(&email).expect("A 252 character email should be valid.");

		assert_eq!(identity.as_ref(), email);
	}

	#[test]
	fn deserialization_enforces_validation() {
		let id: AccountId = serde_json::from_str("\"5b1c3f0e-9a43-4c1f-9b8e-0d5a0a8f0c11\"")
			.expect("Account id should deserialize successfully.");

		assert_eq!(id.as_ref(), "5b1c3f0e-9a43-4c1f-9b8e-0d5a0a8f0c11");
		assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
		assert!(serde_json::from_str::<AccountIdentity>("\"\"").is_err());
	}

	#[test]
	fn borrow_supports_lookup_by_str() {
		let map: HashMap<AccountIdentity, u8> = HashMap::from_iter([(
			AccountIdentity::new("admin@example.com").expect("Identity should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("admin@example.com"), Some(&7));
	}
}
