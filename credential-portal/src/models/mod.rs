pub mod notification;
pub mod outcome;
pub mod qr;
pub mod session;

pub use notification::{Notification, Severity};
pub use outcome::{Operation, OperationOutcome, SuccessPayload};
pub use qr::QrArtifact;
pub use session::{AuthenticatedSession, SessionState};
