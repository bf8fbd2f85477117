use crate::{
    errors::{CallError, PurchaseError},
    inventory::{self, ScanConfig, SnapshotStore},
    occasions::PurchaseRequest,
    source::{OccasionSource, Settlement},
};
use tracing::{info, warn};

/// Outcome of a settled purchase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PurchaseConfirmation {
    pub occasion_id: u64,
    pub tx_hash: String,
}

/// Submits a paid `purchaseTicket` call, awaits settlement, and reconciles
/// the published snapshot afterwards.
///
/// Local state is never touched before settlement; a rejected or reverted
/// purchase leaves the snapshot exactly as it was. After settle-success a
/// single follow-up refresh re-reads the purchased occasion so the snapshot
/// reflects what the chain committed rather than a locally guessed count.
pub async fn purchase<S: OccasionSource>(
    source: &S,
    store: &SnapshotStore,
    request: PurchaseRequest,
    config: &ScanConfig,
) -> Result<PurchaseConfirmation, PurchaseError> {
    if !source.can_sign() {
        return Err(PurchaseError::ReadOnlyConnection);
    }

    let settlement = source
        .purchase_ticket(request.occasion_id, request.payment)
        .await
        .map_err(classify)?;

    match settlement {
        Settlement::Reverted { reason } => Err(PurchaseError::TransactionReverted(reason)),
        Settlement::Confirmed { tx_hash } => {
            info!(
                occasion_id = request.occasion_id,
                %tx_hash,
                "purchase settled"
            );
            if let Err(e) =
                inventory::refresh_occasion(source, store, request.occasion_id, config)
                    .await
            {
                // The chain state did change; the stale snapshot stands
                // until the next scan.
                warn!(
                    occasion_id = request.occasion_id,
                    error = %e,
                    "post-purchase refresh failed"
                );
            }
            Ok(PurchaseConfirmation {
                occasion_id: request.occasion_id,
                tx_hash,
            })
        }
    }
}

fn classify(e: CallError) -> PurchaseError {
    match e {
        CallError::ReadOnly => PurchaseError::ReadOnlyConnection,
        CallError::Rejected(reason) => PurchaseError::UserRejected(reason),
        CallError::Transport(reason) => PurchaseError::SubmissionFailed(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify__maps_call_errors_onto_purchase_taxonomy() {
        assert!(matches!(
            classify(CallError::ReadOnly),
            PurchaseError::ReadOnlyConnection
        ));
        assert!(matches!(
            classify(CallError::Rejected("no".into())),
            PurchaseError::UserRejected(_)
        ));
        assert!(matches!(
            classify(CallError::Transport("down".into())),
            PurchaseError::SubmissionFailed(_)
        ));
    }
}
