// SPDX-License-Identifier: MIT

pub mod credentials;

pub use credentials::CredentialService;
