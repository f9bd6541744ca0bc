//! Certificate construction and signing
//!
//! This module handles certificate construction including:
//! - Random subject names and serial numbers
//! - Validity windows backdated for peer clock skew
//! - Self-signing with the algorithm fixed by the auth type

mod identity;
mod signing;

pub use identity::{random_serial, random_subject, SERIAL_LEN, SUBJECT_RANDOM_LEN};
pub use signing::{sign, UnsignedCertificate, Validity};
