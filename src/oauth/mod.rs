// SPDX-License-Identifier: MIT

//! OAuth flow support shared by every platform adapter.

pub mod state;

pub use state::{IssuedState, StateManager};
