//! Multi-stream watch dashboard.
//!
//! Several live channels from Twitch, Kick and YouTube arranged on one page,
//! each with an optional chat. The library owns the session state and its
//! transitions; the binary serves it to a browser through [`web`].
//!
//! Leaves first:
//!
//! - [`platform`]: embed URL templates and the preset channel catalog
//! - [`layout`]: geometry and layout-mode types
//! - [`entitlement`]: free / premium / trial tiers and their capabilities
//! - [`slots`]: the ordered stream-slot collection
//! - [`arrange`]: pointer-driven drag and corner resize
//! - [`chat`]: floating chat pop-outs
//! - [`onboarding`]: first-run wizard and its persisted flag
//! - [`trial`]: the one-second countdown driver
//! - [`checkout`]: the subscription checkout boundary
//! - [`session`]: the aggregate every interaction goes through

pub mod arrange;
pub mod chat;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod layout;
pub mod onboarding;
pub mod platform;
pub mod session;
pub mod slots;
pub mod trial;
pub mod web;

pub use error::DashboardError;
pub use session::{Action, DashboardSession, DashboardView, Effect, SessionOptions};
