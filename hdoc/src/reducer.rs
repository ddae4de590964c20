//! The pure `docReducer` entry point (spec §6): build a mutable overlay,
//! apply commands, return the resulting snapshot — swallowing fatal errors
//! rather than propagating them (spec §7: "preferring progress over
//! correctness ... is a deliberate choice to keep UI pipelines alive").

use hdoc_core::{mutable_document, Command, NormalizedDocument};
use tap::TapFallible;

/// Applies `commands` to `doc` and returns the resulting snapshot. Any
/// command that fails (bad reference, malformed link shape, bad index, ...)
/// is skipped, and the reducer falls back to the last state the overlay
/// reached before the failure — it never returns an `Err`.
///
/// Each swallowed error is reported via a `tracing::warn!` event at target
/// `"hdoc::reducer"` naming the failing command, so a caller with a
/// subscriber installed can observe the fault without the reducer's
/// contract changing (spec §9 design note).
pub fn doc_reducer(doc: &NormalizedDocument, commands: impl IntoIterator<Item = Command>) -> NormalizedDocument {
    let mut overlay = mutable_document(doc);
    for command in commands {
        let _ = overlay.apply_command(command.clone()).tap_err(|err| {
            tracing::warn!(target: "hdoc::reducer", error = %err, ?command, "command swallowed by doc_reducer");
        });
    }
    overlay.materialize()
}
