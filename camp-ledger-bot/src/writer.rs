//! Single-writer actor for the ledger.
//!
//! Every accrual, reset and summary goes through one background task that owns
//! the ledger and its store, so load-mutate-flush sequences never interleave.
//! Publishing the returned text happens outside the actor.

use crate::accrual;
use crate::store::{self, LedgerStore};
use crate::summary::SummaryFormatter;
use camp_ledger_types::{EmptyStyle, Extraction, Ledger};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Empty-ledger rendering for each publish path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyles {
    /// `!summary` replies
    pub summary: EmptyStyle,
    /// Updates pushed after each accrual
    pub update: EmptyStyle,
}

impl Default for RenderStyles {
    fn default() -> Self {
        Self {
            summary: EmptyStyle::Sentinel,
            update: EmptyStyle::HeaderOnly,
        }
    }
}

/// The ledger together with its store and formatter.
pub struct LedgerState {
    ledger: Ledger,
    store: Arc<dyn LedgerStore>,
    formatter: SummaryFormatter,
    styles: RenderStyles,
}

impl LedgerState {
    /// Load from the store, starting empty if the stored copy is unusable.
    pub fn open(
        store: Arc<dyn LedgerStore>,
        formatter: SummaryFormatter,
        styles: RenderStyles,
    ) -> Self {
        let ledger = store::load_or_empty(store.as_ref());
        Self {
            ledger,
            store,
            formatter,
            styles,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply one extraction, flush, and return the push update text.
    pub fn accrue(&mut self, extraction: &Extraction) -> String {
        accrual::apply(&mut self.ledger, &extraction.subject, &extraction.updates);
        log::info!(
            "Ledger: applied {} update(s) for {}",
            extraction.updates.len(),
            extraction.subject
        );

        // A failed flush keeps the in-memory change; the next flush catches up.
        if let Err(e) = self.store.flush(&self.ledger) {
            log::error!("Ledger: flush failed: {}", e);
        }

        self.formatter.render(&self.ledger, self.styles.update)
    }

    pub fn reset(&mut self) {
        self.ledger = store::reset(self.store.as_ref());
        log::info!("Ledger: reset to empty");
    }

    pub fn summary(&self) -> String {
        self.formatter.render(&self.ledger, self.styles.summary)
    }
}

enum LedgerOp {
    Accrue {
        extraction: Extraction,
        reply: oneshot::Sender<String>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Summary {
        reply: oneshot::Sender<String>,
    },
    #[cfg(test)]
    Snapshot {
        reply: oneshot::Sender<Ledger>,
    },
}

/// Handle to the ledger actor. Cloning shares the same actor.
#[derive(Clone)]
pub struct LedgerWriter {
    tx: mpsc::UnboundedSender<LedgerOp>,
}

impl LedgerWriter {
    /// Spawn the actor task. Must be called inside a tokio runtime.
    pub fn spawn(state: LedgerState) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(state, rx));
        Self { tx }
    }

    async fn run(mut state: LedgerState, mut rx: mpsc::UnboundedReceiver<LedgerOp>) {
        while let Some(op) = rx.recv().await {
            match op {
                LedgerOp::Accrue { extraction, reply } => {
                    let _ = reply.send(state.accrue(&extraction));
                }
                LedgerOp::Reset { reply } => {
                    state.reset();
                    let _ = reply.send(());
                }
                LedgerOp::Summary { reply } => {
                    let _ = reply.send(state.summary());
                }
                #[cfg(test)]
                LedgerOp::Snapshot { reply } => {
                    let _ = reply.send(state.ledger().clone());
                }
            }
        }
        log::info!("Ledger: writer stopped");
    }

    async fn request<T>(
        &self,
        make_op: impl FnOnce(oneshot::Sender<T>) -> LedgerOp,
    ) -> Result<T, String> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make_op(reply))
            .map_err(|_| "Ledger writer is not running".to_string())?;
        rx.await.map_err(|_| "Ledger writer dropped the request".to_string())
    }

    /// Record an extraction; returns the push update text.
    pub async fn accrue(&self, extraction: Extraction) -> Result<String, String> {
        self.request(|reply| LedgerOp::Accrue { extraction, reply }).await
    }

    pub async fn reset(&self) -> Result<(), String> {
        self.request(|reply| LedgerOp::Reset { reply }).await
    }

    /// On-demand render; leaves the ledger untouched.
    pub async fn summary(&self) -> Result<String, String> {
        self.request(|reply| LedgerOp::Summary { reply }).await
    }

    #[cfg(test)]
    async fn snapshot(&self) -> Result<Ledger, String> {
        self.request(|reply| LedgerOp::Snapshot { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Extractor, SubjectPolicy};
    use crate::store::MemoryStore;
    use crate::summary::{NO_DATA_MESSAGE, REPORT_HEADER};
    use camp_ledger_types::{Field, Update};

    fn formatter() -> SummaryFormatter {
        SummaryFormatter::new(vec![Field::MaterialsContributed, Field::AmountWithdrawn])
    }

    fn materials(subject: &str, amount: f64) -> Extraction {
        Extraction {
            subject: subject.to_string(),
            updates: vec![Update::new(Field::MaterialsContributed, amount)],
        }
    }

    #[test]
    fn test_state_opens_from_store() {
        let store = Arc::new(MemoryStore::with_contents(
            r#"{"Mara": {"amountWithdrawn": 100.0}}"#,
        ));
        let mut state = LedgerState::open(store.clone(), formatter(), RenderStyles::default());
        assert_eq!(state.ledger()["Mara"].amount_withdrawn, 100.0);

        state.accrue(&Extraction {
            subject: "Mara".to_string(),
            updates: vec![Update::new(Field::AmountWithdrawn, 400.0)],
        });
        assert_eq!(state.ledger()["Mara"].amount_withdrawn, 500.0);
        assert_eq!(store.load().unwrap()["Mara"].amount_withdrawn, 500.0);
    }

    #[test]
    fn test_log_text_accrues_onto_known_member() {
        let store = Arc::new(MemoryStore::with_contents(
            r#"{"Mara": {"amountWithdrawn": 100.0}}"#,
        ));
        let mut state = LedgerState::open(store.clone(), formatter(), RenderStyles::default());
        let extractor = Extractor::new(SubjectPolicy::default());

        let withdrawal = extractor
            .extract("Discord: @Mara 654321\nWithdrew from clan ledger, $400.00")
            .unwrap();
        state.accrue(&withdrawal);

        let materials = extractor
            .extract("Discord: @Rowan 123456\nMaterials added: 12.5")
            .unwrap();
        let update = state.accrue(&materials);

        assert_eq!(state.ledger()["Mara"].amount_withdrawn, 500.0);
        assert_eq!(state.ledger()["Rowan"].materials_contributed, 12.5);
        assert_eq!(state.ledger()["Rowan"].amount_withdrawn, 0.0);
        assert!(update.contains("@Mara\n  Materials: 0\n  Withdrawn: $500.00"));

        let persisted = store.load().unwrap();
        assert_eq!(persisted["Mara"].amount_withdrawn, 500.0);
        assert_eq!(persisted["Rowan"].materials_contributed, 12.5);
    }

    #[test]
    fn test_state_recovers_from_malformed_store() {
        let store = Arc::new(MemoryStore::with_contents("garbage"));
        let state = LedgerState::open(store, formatter(), RenderStyles::default());
        assert!(state.ledger().is_empty());
    }

    #[test]
    fn test_flush_failure_keeps_mutation() {
        let store = Arc::new(MemoryStore::failing_writes());
        let mut state = LedgerState::open(store.clone(), formatter(), RenderStyles::default());

        let update = state.accrue(&materials("Rowan", 2.0));
        assert!(update.contains("@Rowan"));
        assert_eq!(state.ledger()["Rowan"].materials_contributed, 2.0);
        assert!(store.contents().is_none());
    }

    #[test]
    fn test_reset_then_render_uses_configured_styles() {
        let store = Arc::new(MemoryStore::new());
        let mut state = LedgerState::open(store.clone(), formatter(), RenderStyles::default());
        state.accrue(&materials("Rowan", 2.0));

        state.reset();
        assert!(state.ledger().is_empty());
        assert_eq!(state.summary(), NO_DATA_MESSAGE);
        assert!(store.load().unwrap().is_empty());

        let header_styles = RenderStyles {
            summary: EmptyStyle::HeaderOnly,
            update: EmptyStyle::HeaderOnly,
        };
        let state = LedgerState::open(store, formatter(), header_styles);
        assert_eq!(state.summary(), REPORT_HEADER);
    }

    #[tokio::test]
    async fn test_writer_accrue_and_summary() {
        let store = Arc::new(MemoryStore::new());
        let writer = LedgerWriter::spawn(LedgerState::open(
            store.clone(),
            formatter(),
            RenderStyles::default(),
        ));

        assert_eq!(writer.summary().await.unwrap(), NO_DATA_MESSAGE);

        let update = writer.accrue(materials("Rowan", 5.0)).await.unwrap();
        assert!(update.starts_with(REPORT_HEADER));
        writer.accrue(materials("Rowan", 3.5)).await.unwrap();

        let summary = writer.summary().await.unwrap();
        assert!(summary.contains("Materials: 8.5"));
        assert_eq!(store.load().unwrap()["Rowan"].materials_contributed, 8.5);
    }

    #[tokio::test]
    async fn test_concurrent_accruals_are_serialized() {
        let store = Arc::new(MemoryStore::new());
        let writer = LedgerWriter::spawn(LedgerState::open(
            store.clone(),
            formatter(),
            RenderStyles::default(),
        ));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                writer.accrue(materials("Rowan", 1.0)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(writer.snapshot().await.unwrap()["Rowan"].materials_contributed, 50.0);
        assert_eq!(store.load().unwrap()["Rowan"].materials_contributed, 50.0);
    }

    #[tokio::test]
    async fn test_writer_reset() {
        let store = Arc::new(MemoryStore::new());
        let writer = LedgerWriter::spawn(LedgerState::open(
            store.clone(),
            formatter(),
            RenderStyles::default(),
        ));
        writer.accrue(materials("Rowan", 1.0)).await.unwrap();
        writer.accrue(materials("Mara", 1.0)).await.unwrap();

        writer.reset().await.unwrap();
        assert!(writer.snapshot().await.unwrap().is_empty());
        assert!(store.load().unwrap().is_empty());
    }
}
