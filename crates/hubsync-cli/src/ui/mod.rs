//! Terminal output.
//!
//! - [`theme`] - Colors, icons, and column widths
//! - [`output`] - The [`Output`] handle commands print through; it is also
//!   the [`hubsync_core::Reporter`] handed to the sync engine

pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
