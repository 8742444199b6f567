//! Application services: e-mail delivery, letter generation and the admin
//! write path shared with the pending write replay job.

pub mod admin_writes;
pub mod email;
pub mod letters;

pub use admin_writes::AdminWriter;
pub use email::{EmailError, EmailMessage, EmailService};
pub use letters::{LetterClient, LetterError};
