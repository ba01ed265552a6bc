// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream clients and refresh logic.

pub mod cognito;
pub mod coordinator;
pub mod credentials;
pub mod insnrg;

pub use cognito::{AuthenticationResult, CognitoClient, IdentityError, IdentityProvider};
pub use coordinator::{RefreshCoordinator, RefreshError};
pub use credentials::{CredentialError, CredentialManager};
pub use insnrg::{FetchError, InsnrgClient, ResourceApi, Screen};
