use oms_api::OrderState;
use thiserror::Error;

/// A transition the lifecycle table does not allow. The order it was
/// requested for is left untouched; reporting the attempt is the caller's
/// job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: OrderState,
    pub to: OrderState,
}

/// States reachable from `current` in one legal step.
pub fn allowed_transitions(current: OrderState) -> &'static [OrderState] {
    match current {
        OrderState::New => &[OrderState::Acked, OrderState::Rejected],
        OrderState::Acked => &[OrderState::Filled, OrderState::Canceled],
        OrderState::Filled | OrderState::Canceled | OrderState::Rejected => &[],
    }
}

/// Pure transition check: a function of (current, requested) and nothing
/// else. It touches no book, ledger or sink; the engine sequences those
/// effects around it.
pub fn transition(
    current: OrderState,
    requested: OrderState,
) -> Result<OrderState, IllegalTransition> {
    if allowed_transitions(current).contains(&requested) {
        Ok(requested)
    } else {
        Err(IllegalTransition {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oms_api::OrderState::*;

    const ALL: [OrderState; 5] = [New, Acked, Filled, Canceled, Rejected];

    #[test]
    fn legal_transitions_pass() {
        assert_eq!(transition(New, Acked), Ok(Acked));
        assert_eq!(transition(New, Rejected), Ok(Rejected));
        assert_eq!(transition(Acked, Filled), Ok(Filled));
        assert_eq!(transition(Acked, Canceled), Ok(Canceled));
    }

    #[test]
    fn everything_else_is_illegal() {
        let legal = [
            (New, Acked),
            (New, Rejected),
            (Acked, Filled),
            (Acked, Canceled),
        ];
        for from in ALL {
            for to in ALL {
                if legal.contains(&(from, to)) {
                    continue;
                }
                let err = transition(from, to).unwrap_err();
                assert_eq!(err, IllegalTransition { from, to });
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for state in [Filled, Canceled, Rejected] {
            assert!(allowed_transitions(state).is_empty());
        }
    }

    #[test]
    fn self_transitions_are_illegal() {
        for state in ALL {
            assert!(transition(state, state).is_err());
        }
    }
}
