//! Which governed actions may run in which access mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every action that passes through the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernedAction {
    RecruitAgent,
    SubmitSignal,
    ApproveSignal,
    RejectSignal,
    IssueWarning,
    ExcludeAgent,
    ModifyAgent,
    AuditAgent,
    ReviewAllAgents,
    EnterRestrictedMode,
    ExitRestrictedMode,
    ManualUnblock,
    DisableAudit,
    Consultation,
    Export,
    Replay,
    Simulation,
    ListAgents,
    ViewKpi,
    ViewAuditLog,
}

impl GovernedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernedAction::RecruitAgent => "recruit_agent",
            GovernedAction::SubmitSignal => "submit_signal",
            GovernedAction::ApproveSignal => "approve_signal",
            GovernedAction::RejectSignal => "reject_signal",
            GovernedAction::IssueWarning => "issue_warning",
            GovernedAction::ExcludeAgent => "exclude_agent",
            GovernedAction::ModifyAgent => "modify_agent",
            GovernedAction::AuditAgent => "audit_agent",
            GovernedAction::ReviewAllAgents => "review_all_agents",
            GovernedAction::EnterRestrictedMode => "enter_restricted_mode",
            GovernedAction::ExitRestrictedMode => "exit_restricted_mode",
            GovernedAction::ManualUnblock => "manual_unblock",
            GovernedAction::DisableAudit => "disable_audit",
            GovernedAction::Consultation => "consultation",
            GovernedAction::Export => "export",
            GovernedAction::Replay => "replay",
            GovernedAction::Simulation => "simulation",
            GovernedAction::ListAgents => "list_agents",
            GovernedAction::ViewKpi => "view_kpi",
            GovernedAction::ViewAuditLog => "view_audit_log",
        }
    }

    /// Actions that never change governed state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            GovernedAction::Consultation
                | GovernedAction::Export
                | GovernedAction::Replay
                | GovernedAction::Simulation
                | GovernedAction::ListAgents
                | GovernedAction::ViewKpi
                | GovernedAction::ViewAuditLog
        )
    }

    /// Actions named explicitly as forbidden while restricted.
    pub fn is_restricted_forbidden(&self) -> bool {
        matches!(
            self,
            GovernedAction::ApproveSignal
                | GovernedAction::RecruitAgent
                | GovernedAction::ModifyAgent
                | GovernedAction::ExcludeAgent
                | GovernedAction::DisableAudit
        )
    }
}

impl fmt::Display for GovernedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    Standard,
    /// Read-only operation; only consultation and leaving the mode are allowed.
    Restricted,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessMode::Standard => "standard",
            AccessMode::Restricted => "restricted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(String),
}

/// Static allow/deny table.
pub fn evaluate(action: GovernedAction, mode: AccessMode) -> PolicyDecision {
    if action == GovernedAction::DisableAudit {
        return PolicyDecision::Deny("the audit system cannot be disabled".to_string());
    }
    match mode {
        AccessMode::Standard => PolicyDecision::Allow,
        AccessMode::Restricted if action.is_restricted_forbidden() => {
            PolicyDecision::Deny(format!("'{action}' is forbidden in restricted mode"))
        }
        AccessMode::Restricted
            if action.is_read_only() || action == GovernedAction::ExitRestrictedMode =>
        {
            PolicyDecision::Allow
        }
        AccessMode::Restricted => {
            PolicyDecision::Deny(format!("'{action}' is not allowed in restricted mode"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mode_allows_everything_but_disabling_audit() {
        assert_eq!(evaluate(GovernedAction::ApproveSignal, AccessMode::Standard), PolicyDecision::Allow);
        assert!(matches!(
            evaluate(GovernedAction::DisableAudit, AccessMode::Standard),
            PolicyDecision::Deny(_)
        ));
    }

    #[test]
    fn restricted_mode_is_read_only() {
        for action in [
            GovernedAction::ListAgents,
            GovernedAction::ViewKpi,
            GovernedAction::Export,
            GovernedAction::Replay,
            GovernedAction::ExitRestrictedMode,
        ] {
            assert_eq!(evaluate(action, AccessMode::Restricted), PolicyDecision::Allow, "{action}");
        }
        for action in [
            GovernedAction::ApproveSignal,
            GovernedAction::RecruitAgent,
            GovernedAction::ModifyAgent,
            GovernedAction::ExcludeAgent,
            GovernedAction::DisableAudit,
            GovernedAction::SubmitSignal,
            GovernedAction::IssueWarning,
        ] {
            assert!(
                matches!(evaluate(action, AccessMode::Restricted), PolicyDecision::Deny(_)),
                "{action}"
            );
        }
    }

    #[test]
    fn action_names_match_serde() {
        let v = serde_json::to_value(GovernedAction::ViewAuditLog).unwrap();
        assert_eq!(v, serde_json::json!(GovernedAction::ViewAuditLog.as_str()));
    }
}
