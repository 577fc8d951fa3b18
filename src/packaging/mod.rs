//! Static checks for container build descriptions: a Dockerfile parser and an
//! inspector that validates it against its build context.

pub mod dockerfile;
pub mod inspect;

pub use dockerfile::{Command, Dockerfile, ImageRef, Instruction, InstructionKind};
pub use inspect::{
    inspect, inspect_path, Finding, FindingKind, InspectOptions, InspectionReport, Severity,
};
