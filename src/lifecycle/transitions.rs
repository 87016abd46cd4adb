use crate::domain::OrderStatus;
use super::OrderError;

/// Position in the forward sequence. `Cancelled` sits outside it.
fn stage(status: OrderStatus) -> Option<u8> {
    match status {
        OrderStatus::Pending => Some(0),
        OrderStatus::Confirmed => Some(1),
        OrderStatus::Preparing => Some(2),
        OrderStatus::Ready => Some(3),
        OrderStatus::OutForDelivery => Some(4),
        OrderStatus::Delivered => Some(5),
        OrderStatus::Cancelled => None,
    }
}

/// Whether an order may move from `from` to `to`.
///
/// Terminal statuses never move. Otherwise an order may advance to any later
/// status (steps can be skipped, e.g. `ready → delivered` for pickups) or be
/// cancelled. Moving backwards and staying put are not transitions.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() || from == to {
        return false;
    }
    match (stage(from), stage(to)) {
        (_, None) => true,
        (Some(a), Some(b)) => b > a,
        (None, Some(_)) => false,
    }
}

/// Like [`can_transition`] but reports why a move is refused.
pub fn check_transition(id: &str, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if from.is_terminal() {
        return Err(OrderError::TerminalStatus { id: id.to_string(), status: from });
    }
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}
