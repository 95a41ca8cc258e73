pub mod store;
pub mod token;

pub use store::{
    CertificateSource, CredentialStore, FileCredentialStore, InMemoryCredentialStore,
    StoredCredential,
};
pub use token::{CommandTokenProducer, TokenProducer};
