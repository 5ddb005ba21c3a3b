pub mod verifier;

pub use verifier::{ExpectedContent, PostVerifier, Verdict};
