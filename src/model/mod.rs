//! Domain entities shared across the engine.

pub mod enforcement;
pub mod telemetry;
pub mod trip;

pub use enforcement::{
    ActionId, ActionSeverity, Alert, AlertId, ApprovalOverride, AuditEntry, CriticalFailure,
    EnforcementAction, EnforcementRule, EscalationWorkflow, FailureId, MaintenanceTask,
    RegulatorySubmission, RegulatoryVerdict, RuleId, RuleKind, WorkflowId,
};
pub use telemetry::{
    FatigueLevel, FatigueSample, SpeedSample, Violation, ViolationId, ViolationSeverity,
};
pub use trip::{
    FieldType, ItemId, ModuleId, ModuleItem, ModuleStatus, RiskLevel, Trip, TripId, TripModule,
    TripStatus, FAIL_VALUE, MODULE_TEMPLATE,
};
