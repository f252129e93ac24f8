//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Simple display components that receive all data as parameters:
//! - `TitleBar`: Top status bar showing endpoint, phase and notices
//! - `Message`: One transcript turn, with its rendered element
//! - `ListingPanel`: The listing draft fed by apply actions
//!
//! `element` is not a component but the pure mapping from an A2UI element to
//! lines and affordances that `Message` draws.
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: Composer with `/attach` and `/detach` commands
//! - `MessageList`: Scrollable conversation view with layout caching
//!
//! ## Props-Based Data Flow
//!
//! Components receive external data as "props" (struct fields), not by
//! reading `App` directly. This keeps dependencies explicit and components
//! testable with a `TestBackend`.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file)
//! ├── element.rs        (A2UI element → lines + affordances)
//! ├── input_box.rs      (Composer)
//! ├── listing_panel.rs  (Listing draft side panel)
//! ├── message.rs        (Single turn renderer)
//! ├── message_list.rs   (Scrollable turn container)
//! └── title_bar.rs      (Top status bar)
//! ```

pub mod element;
pub mod input_box;
pub mod listing_panel;
pub mod message;
pub mod message_list;
mod title_bar;

pub use element::render_element;
pub use input_box::{InputBox, InputEvent};
pub use listing_panel::ListingPanel;
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
