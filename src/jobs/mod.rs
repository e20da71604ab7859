//! Background jobs processed by the `jobs work` worker.

mod email_job;
mod notifier;
mod order_confirmation;

pub use email_job::{email_job_handler, EmailJob};
pub use notifier::{LogNotifier, OrderNotifier, QueueNotifier};
pub use order_confirmation::{order_confirmation_handler, ConfirmationLine, OrderConfirmationJob};

#[cfg(any(test, feature = "test-utils"))]
pub use notifier::MockOrderNotifier;
