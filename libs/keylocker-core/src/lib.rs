//! The KeyFile format, password-to-slot derivation pipeline, Shamir/plain
//! share encoding, the slot-overwrite collision model, and the byte-range
//! I/O layer that lets a KeyFile live inside a file or the free space of a
//! block device.
//!
//! This crate has no notion of a CLI, an argument grammar, or an
//! interactive password prompt — those live in `keylocker-cli`. Every
//! operation here takes an explicit `&mut dyn Region` and, where entropy is
//! consumed, an explicit `&mut EntropySource`: there is no ambient global
//! state.

pub mod derive;
pub mod entropy;
pub mod entry;
pub mod error;
pub mod keyfile;
pub mod params;
pub mod region;
pub mod shamir;
pub mod slot;

pub use entropy::EntropySource;
pub use entry::Entry;
pub use error::{Error, PublicError, RecoveryFailure};
pub use params::{Mode, Params};
pub use region::Region;
