//! Domain models for the marketplace.
//!
//! Each model is both the row type loaded by its repository and the JSON
//! shape returned by the API. Secrets (password hashes) live in separate row
//! types and never reach a response.

pub mod cart;
pub mod category;
pub mod complaint;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod store;
pub mod user;

pub use cart::{CartLine, CartView};
pub use category::Category;
pub use complaint::Complaint;
pub use coupon::Coupon;
pub use order::{Order, OrderItem};
pub use payment::PaymentTransaction;
pub use product::{Product, ProductListing};
pub use review::Review;
pub use store::Store;
pub use user::{CurrentUser, User};
