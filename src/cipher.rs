pub mod aesgcm;
pub mod envelope;
pub mod privkey;
