//! # Automation Providers
//!
//! Providers are the executable steps of an automation: each one takes a
//! JSON configuration authored in the product console and performs its work
//! when a system event triggers the automation. This crate currently ships
//! the PatchObject provider, a small interpreter that builds or reshapes a
//! JSON document through an ordered list of operations:
//!
//! ```text
//!   configuration JSON
//!        |
//!        v
//!   PatchObject::from_json        parse seed document + operations
//!        |
//!        v
//!   resolve()                     fold the operation list over the document
//!        |                        (each failure condition resolved by its
//!        |                         configured policy)
//!        v
//!   PatchResolution               patched document + completed/ended
//! ```
//!
//! Failure conditions (missing parents, existing destinations and the like)
//! are not always errors: each operation carries per-condition policies
//! choosing between raising, skipping the operation, or ending the run.

pub mod error;
pub mod patch_object;

pub use error::PatchObjectError;
pub use patch_object::{
    apply_operation, AddOperation, CopyOperation, ExistsPolicy, FailurePolicy, FailureReason,
    MoveOperation, Operation, OperationKind, OperationOutcome, PatchObject, PatchObjectConfig,
    PatchResolution, RemoveOperation, ReplaceMissingPolicy, ReplaceOperation, ResolveOutcome,
    SeedObject,
};
