//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`User`] - A registered account
//! - [`ShortLink`] - A short code owned by a user
//! - [`RedirectLog`] - One recorded redirect through a short link
//!
//! Creation inputs live next to their entity (`NewUser`, `NewShortLink`,
//! `NewRedirectLog`); partial updates use [`ShortLinkPatch`].

pub mod link;
pub mod redirect_log;
pub mod user;

pub use link::{NewShortLink, ShortLink, ShortLinkPatch};
pub use redirect_log::{
    GroupCount, LinkAnalytics, NewRedirectLog, RedirectLog, UNKNOWN_COUNTRY,
};
pub use user::{NewUser, User};
