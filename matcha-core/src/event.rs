//! Events surfaced by the engine to its embedder.
//!
//! Events flow outward only: the controller queues them while applying
//! commands and the embedder drains the queue between feeds. The engine
//! itself never touches the system clipboard or rings a bell.

/// An outbound terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermEvent {
    /// BEL (0x07) received.
    Bell,

    /// OSC 52 clipboard store request.
    ///
    /// `selector` names the target clipboard (e.g. `c`, `p`) and `data`
    /// carries the base64 payload exactly as received.
    ClipboardStore { selector: String, data: String },
}
