pub mod client;
pub mod folds;
pub mod sanitize;
pub mod search;
pub mod traits;
pub mod types;

pub use client::CarousellClient;
pub use traits::CarousellApi;
