/// Deferred control signals. Enqueued by transports without blocking and
/// applied one at a time by the command worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Clear the video hold and force a switch on the next poll.
    Next,
    /// Rewind so the next switch lands on the prior item.
    Previous,
}
