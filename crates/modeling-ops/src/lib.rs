pub mod boolean;
pub mod edge_select;
pub mod fillet;
pub mod kernel_ext;
pub mod tool;
pub mod transform;
pub mod types;

pub use boolean::{apply_tool, execute_boolean, BooleanKind};
pub use edge_select::{
    same_edge_set, select_edges, EdgeKey, EdgePredicate, ZoneMode, COINCIDENT_TOL,
    PERIMETER_TOL, SNAP_TOL,
};
pub use fillet::{
    execute_fillet, fillet_with_fallback, FallbackPolicy, FilletMode, FilletReport, FilletSpec,
};
pub use kernel_ext::KernelBundle;
pub use tool::Tool;
pub use transform::{execute_mirror, execute_transform};
pub use types::*;
