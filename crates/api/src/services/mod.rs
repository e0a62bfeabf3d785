//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password registration, login and reset codes
//! - `email` - Email delivery via SMTP
//! - `stripe` - Stripe Checkout client and webhook verification
//! - `token` - Bearer token issuing and verification
//! - `uploads` - Product image storage

pub mod auth;
pub mod email;
pub mod stripe;
pub mod token;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use stripe::{StripeClient, StripeError};
pub use token::{Claims, TokenError, TokenService};
pub use uploads::{UploadError, UploadStore};
