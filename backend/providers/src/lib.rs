pub mod builtin;
pub mod client;
pub mod credentials;
pub mod field_path;
pub mod mock;
pub mod registry;

pub use builtin::builtin_providers;
pub use client::{build_payload, normalize_response, HttpModelClient, DEFAULT_TIMEOUT};
pub use credentials::{EnvCredentials, StaticCredentials};
pub use mock::MockClient;
pub use registry::{ProviderRegistry, RegistryError};
