use crate::message::{keys, AppMessage};

/// Requests arriving from the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEvent {
    /// The watch asked for fresh scores
    RequestScores,
}

impl InboundEvent {
    /// Interpret an inbound message; anything unrecognized is ignored
    pub fn from_app_message(message: &AppMessage) -> Option<Self> {
        match message.get(keys::REQUEST_SCORES) {
            Some(value) if value != 0 => Some(InboundEvent::RequestScores),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_scores_needs_non_zero_value() {
        let request: AppMessage = [(keys::REQUEST_SCORES, 1)].into_iter().collect();
        let cleared: AppMessage = [(keys::REQUEST_SCORES, 0)].into_iter().collect();
        let other: AppMessage = [(keys::AUTH_STATUS, 1)].into_iter().collect();

        assert_eq!(
            InboundEvent::from_app_message(&request),
            Some(InboundEvent::RequestScores)
        );
        assert_eq!(InboundEvent::from_app_message(&cleared), None);
        assert_eq!(InboundEvent::from_app_message(&other), None);
    }
}
