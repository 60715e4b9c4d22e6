//! Accounts, OAuth2 tokens and bearer authentication.

pub mod account;
pub mod extractor;
pub mod token;

pub use account::{AccountService, AuthError, UserDetails};
pub use extractor::CurrentAccount;
pub use token::{ClientCredentials, OAuthError, TokenRequest, TokenResponse, TokenService};
