//! Profile management for a signed-in member: view, edit, photo, and the
//! education and work-experience sections.

pub mod draft;
pub mod manager;

pub use draft::{EducationDraft, WorkDraft};
pub use manager::{ProfileManager, ProfileView};
