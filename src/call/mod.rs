//! Call-lifecycle bridge
//!
//! Platform telephony reports raw call states; the orchestrator only wants
//! the started/ended edges. The bridge tracks the in-call flag and forwards
//! exactly one notification per edge, ignoring ringing and repeated states.

use anyhow::Result;
use tracing::info;

use crate::session::SessionHandle;

/// Raw telephony state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call activity
    Idle,
    /// Incoming call ringing, not yet answered
    Ringing,
    /// A call is active (dialing, connected, or on hold)
    OffHook,
}

/// Edge detector between platform call states and orchestrator notifications
pub struct CallBridge {
    handle: SessionHandle,
    in_call: bool,
}

impl CallBridge {
    pub fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            in_call: false,
        }
    }

    pub async fn on_state_change(
        &mut self,
        state: CallState,
        phone_number: Option<&str>,
    ) -> Result<()> {
        match state {
            CallState::OffHook if !self.in_call => {
                self.in_call = true;
                info!(
                    "Call started ({})",
                    phone_number.unwrap_or("unknown number")
                );
                self.handle
                    .call_started(phone_number.map(str::to_string))
                    .await
            }
            CallState::Idle if self.in_call => {
                self.in_call = false;
                info!("Call ended");
                self.handle.call_ended().await
            }
            // Ringing and repeated states carry no edge
            _ => Ok(()),
        }
    }
}
