use crate::{InvalidPage, PageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The reader produced a valid page.
    PageRead(PageRecord),
    /// The reader hit a page element without usable title or text.
    PageInvalid(InvalidPage),
    /// The dump has no more page elements.
    StreamEnded,
    /// Cancellation was observed at the top of the page loop.
    CancelRequested,
    /// Every record of the dispatched batch has finished.
    BatchCompleted { succeeded: u64, failed: u64 },
    /// Fallback for placeholder wiring.
    NoOp,
}
