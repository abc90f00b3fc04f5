//! Outbound command path
//!
//! - [`feeder`]: per-source queues of lines waiting to be sent
//! - [`sender`]: flow-controlled writes and acknowledgment matching
//! - [`workflow`]: state machine deciding when the feeder may drain
//! - [`realtime`]: control bytes that bypass both
//! - [`program`]: comment stripping for whole programs

pub mod feeder;
pub mod program;
pub mod realtime;
pub mod sender;
pub mod workflow;

pub use feeder::Feeder;
pub use program::{program_lines, strip_comments};
pub use realtime::{OverrideStep, RapidOverrideLevel, RealtimeCommand};
pub use sender::{FlowControl, Sender, DEFAULT_RX_BUFFER};
pub use workflow::{StartConditions, Transition, Workflow};
