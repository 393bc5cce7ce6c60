//! IDE features - high-level APIs for editor requests.
//!
//! Each function takes a graph snapshot and returns plain data; conversion
//! to protocol types happens at the server boundary.
//!
//! ## Usage
//!
//! ```ignore
//! let analysis = Analysis::stable(&host, env).await;
//! let hover = analysis.hover(file, Position::new(3, 8));
//! let value = analysis.resolve_macro("DT_PROP(DT_NODELABEL(uart0), current_speed)");
//! ```

mod analysis;
mod goto;
mod hover;

pub use analysis::Analysis;
pub use goto::{GotoResult, GotoTarget, goto_definition};
pub use hover::{HoverResult, MacroHover, hover, hover_macro, render_value};
