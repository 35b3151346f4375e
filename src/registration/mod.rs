//! Join screen: form validation and the sign-up flow that stages nested
//! profile records for later reconciliation.

pub mod flow;
pub mod form;

pub use flow::{PhotoUpload, RegisteredUser, RegistrationFlow};
pub use form::{EducationEntry, JoinForm, PAYAMS, WorkEntry};
