// Ticket allocation

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::TicketNumber;
use crate::error::Result;
use tracing::debug;

/// Issues per-queue sequential ticket numbers
pub struct TicketAllocator;

impl TicketAllocator {
    /// One above the highest ticket the queue has ever issued, or 1 for a
    /// fresh queue.
    ///
    /// The high-water mark lives on the locked queue row and is persisted by
    /// the `save_queue` that follows, so purged or reset entries never make a
    /// number come back. Runs inside the queue's unit of work, so the read and
    /// the insert that follows are serialized against every other writer.
    pub async fn allocate(uow: &mut UnitOfWork) -> Result<TicketNumber> {
        let queue_id = uow.queue.id.clone();
        let stored_max = uow.tx().max_ticket_number(&queue_id).await?;
        let ticket_number = uow.queue.issue_ticket(stored_max);

        debug!(queue_id = %queue_id, ticket_number, "Ticket allocated");
        Ok(ticket_number)
    }
}
