mod resolver;

pub use resolver::{IdentifierResolver, PlatformPattern};
