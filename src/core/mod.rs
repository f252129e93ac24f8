//! # Core Application Logic
//!
//! The assistant's business logic. It knows nothing about any specific UI
//! technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Transcript, dispatch │
//!                    │                         │
//!                    │  No network. No UI.     │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │ inference  │
//!     │  Adapter   │                          │  (HTTP +   │
//!     │ (ratatui)  │                          │  ingestor) │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`transcript`]: Ordered turns of the session
//! - [`dispatch`]: Routing of element actions
//! - [`attachment`]: Image encoding for outgoing turns
//! - [`config`]: Layered configuration

pub mod action;
pub mod attachment;
pub mod config;
pub mod dispatch;
pub mod state;
pub mod transcript;
