mod loader;

pub use loader::{SubTypeLoader, SubTypeLoaderError, SubTypeRecord};
