pub mod shell;
pub mod workflow;

pub use shell::{Screen, TerminalShell, UiShell};
pub use workflow::{FlowOutcome, GradeOutcome, SwipeOutcome, Workflow, WorkflowError};
