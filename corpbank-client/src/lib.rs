pub mod client;
pub mod options;

pub use client::{Client, ClientOptions};
pub use options::RequestOption;
