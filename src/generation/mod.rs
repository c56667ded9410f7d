//! Generation Passes
//!
//! Pure, synchronous passes that turn a bay's nomenclature and user-placed
//! members into absolute pieces. They run in a fixed order, each consuming
//! the previous pass's output: frame, imposte injection, intermediate
//! materialization, transom segmentation, glazing cells. Store I/O happens
//! between passes, in [`crate::regeneration`].

pub mod frame;
pub mod glazing;
pub mod imposte;
pub mod intermediate;
pub mod transom;

pub use frame::{generate_frame, FrameLayout, FrameMember};
pub use glazing::{generate_cells, GlazingLayout};
pub use imposte::{plan_imposte, ImposteAction};
pub use intermediate::{materialize_members, Member, MemberKind, MullionLayout};
pub use transom::segment_transoms;
