pub mod bearer_token;
pub mod configuration;
pub mod credentials;
pub mod error;
pub mod transaction;

pub use bearer_token::*;
pub use configuration::*;
pub use credentials::*;
pub use error::*;
pub use transaction::*;
