use std::any::Any;

use crate::event::Event;
use crate::thread::ThreadId;
use crate::unit::Instance;

/// Notifications emitted by the lifecycle engine
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A thread finished starting every unit it requires
    Started { thread: ThreadId, units: Vec<String> },
    /// A thread was stopped and its record removed, whether or not its
    /// stop sequence succeeded
    Stopped { thread: ThreadId, success: bool },
    /// A unit was physically started
    UnitStarted { name: String, instance: Instance },
    /// A unit was physically stopped and its instance dropped from the registry
    UnitStopped { name: String },
}

impl LifecycleEvent {
    pub const STARTED: &'static str = "started";
    pub const STOPPED: &'static str = "stopped";
    pub const UNIT_STARTED: &'static str = "unit:started";
    pub const UNIT_STOPPED: &'static str = "unit:stopped";

    /// Unit name carried by unit-level events
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            LifecycleEvent::UnitStarted { name, .. } | LifecycleEvent::UnitStopped { name } => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Thread id carried by thread-level events
    pub fn thread_id(&self) -> Option<ThreadId> {
        match self {
            LifecycleEvent::Started { thread, .. } | LifecycleEvent::Stopped { thread, .. } => {
                Some(*thread)
            }
            _ => None,
        }
    }
}

impl Event for LifecycleEvent {
    fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Started { .. } => Self::STARTED,
            LifecycleEvent::Stopped { .. } => Self::STOPPED,
            LifecycleEvent::UnitStarted { .. } => Self::UNIT_STARTED,
            LifecycleEvent::UnitStopped { .. } => Self::UNIT_STOPPED,
        }
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
