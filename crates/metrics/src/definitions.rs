//! Metric name constants, grouped by subsystem.

/// Command dispatch pipeline metrics
pub mod commands {
    /// Messages that entered the dispatcher
    pub const MESSAGES_RECEIVED_TOTAL: &str = "regnum_command_messages_received_total";
    /// Messages that resolved to a command and passed the permission gate
    pub const DISPATCHED_TOTAL: &str = "regnum_commands_dispatched_total";
    /// Messages dropped before reaching a command (no prefix, unknown alias, ...)
    pub const IGNORED_TOTAL: &str = "regnum_command_messages_ignored_total";
    /// Messages that were denied by the permission gate
    pub const PERMISSION_DENIED_TOTAL: &str = "regnum_command_permission_denied_total";
    /// Command bodies that completed without error
    pub const EXECUTED_TOTAL: &str = "regnum_commands_executed_total";
    /// Command bodies that returned an error or panicked
    pub const FAILED_TOTAL: &str = "regnum_commands_failed_total";
    /// Command body execution time
    pub const EXECUTION_DURATION_SECONDS: &str = "regnum_command_execution_duration_seconds";
    /// Command bodies currently executing
    pub const IN_FLIGHT: &str = "regnum_commands_in_flight";
    /// Registered alias entries in the root registry
    pub const ALIASES_REGISTERED: &str = "regnum_command_aliases_registered";
}

/// Common label keys
pub mod labels {
    pub const COMMAND: &str = "command";
    pub const REASON: &str = "reason";
}

