//! Firebase Authentication and Cloud Firestore over their REST APIs

pub mod access_token;
pub mod client;
pub mod error;
pub mod firestore;
pub mod identity;
pub mod service_account;
pub mod value;

pub use access_token::AccessTokenProvider;
pub use client::{http_client, FirebaseHttp};
pub use firestore::FirestoreDocuments;
pub use identity::{FirebaseIdentity, FirebasePasswordSignIn};
pub use service_account::ServiceAccountKey;
