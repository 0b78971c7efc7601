//! # The Oracle: Incremental Personal-Data Reachability
//!
//! **Role**: Consumes per-unit method facts in whatever order the front end
//! delivers them and decides, per entry point, which personal-data
//! categories and external transfers it can reach.
//!
//! **Pipeline**:
//! 1. [`Session::ingest`] registers a unit's methods (first registration wins)
//!    and feeds the [`ImplementationIndex`].
//! 2. The [`Resolver`] walks the call graph from each entry point, unioning
//!    across every interface implementation.
//! 3. Entry points that reach not-yet-registered methods of the same
//!    namespace are parked on the [`WaitList`] and resolved again, from
//!    scratch, once the last missing method arrives.
//! 4. Entry points that reach a missing method outside the namespace are
//!    blocked: no report, no retry, listed when the session finishes.
//! 5. Finished reports go to a [`scribe::ReportSink`]. A report is
//!    rewritten when an interface it fanned out over gains an implementation.
//!
//! All state lives in one [`Session`]; nothing is global.

pub mod graph;
pub mod index;
pub mod resolver;
pub mod session;
pub mod waitlist;

pub use graph::{CallGraph, EdgeKind, GraphStats};
pub use index::ImplementationIndex;
pub use resolver::{EntryResolution, Missing, Reach, Resolver};
pub use session::{Resolution, Session, SessionStats, SessionSummary, UnitOutcome};
pub use waitlist::{WaitList, WaitListEntry};
