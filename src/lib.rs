pub mod diff;
pub mod encoding;
pub mod error;
pub mod locate;
pub mod logging;
pub mod normalize;
pub mod ops;
pub mod replace;
pub mod verify;

pub use error::ReplaceError;
pub use normalize::{Normalized, normalize, normalize_pattern};
pub use ops::{EditOp, EditPlan, apply_ops, group_by_path, load_plan};
pub use replace::{apply_exact_replace, apply_global_replace, apply_replacements};
pub use verify::VerifiedMatch;
