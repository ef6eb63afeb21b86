//! Centralized authorization capability checks.
//!
//! Role-to-capability mapping lives here and nowhere else: engine code asks
//! `can_perform` instead of branching on role values. Visibility scoping is
//! a separate question answered by `can_see`; callers translate a failed
//! visibility check into `NotFound` so out-of-scope records are never
//! confirmed to exist.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles recognized by the engine, in ascending privilege order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Driver,
    Supervisor,
    Admin,
}

/// The identity performing an operation, resolved by the (out of scope)
/// session layer before the engine is invoked.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub org_id: Uuid,
    pub role: Role,
}

/// Operations gated by authorization.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Capability {
    EditTripItems,
    SubmitTrip,
    ReviewTrip,
    IngestTelemetry,
    ManageAlerts,
    RunSweep,
    SubmitRegulatory,
    DefineGlobalRules,
}

/// Check whether an actor may exercise a capability against a resource
/// owned by `resource_org`.
///
/// Admins may do anything anywhere. Everyone else is confined to their own
/// organization and to their role's capability set.
pub fn can_perform(actor: &Actor, capability: Capability, resource_org: Uuid) -> bool {
    if actor.role == Role::Admin {
        return true;
    }
    if actor.org_id != resource_org {
        return false;
    }
    match actor.role {
        Role::Driver => matches!(
            capability,
            Capability::EditTripItems | Capability::SubmitTrip | Capability::IngestTelemetry
        ),
        Role::Supervisor => matches!(
            capability,
            Capability::EditTripItems
                | Capability::SubmitTrip
                | Capability::ReviewTrip
                | Capability::IngestTelemetry
                | Capability::ManageAlerts
                | Capability::RunSweep
                | Capability::SubmitRegulatory
        ),
        Role::Admin => true,
    }
}

/// Check whether a resource in `resource_org` is visible to the actor.
pub fn can_see(actor: &Actor, resource_org: Uuid) -> bool {
    actor.role == Role::Admin || actor.org_id == resource_org
}

/// Check whether the actor may mutate trip data regardless of lifecycle
/// state. Only admins hold this blanket permission.
pub fn can_always_write(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, org: Uuid) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            org_id: org,
            role,
        }
    }

    #[test]
    fn driver_cannot_review() {
        let org = Uuid::new_v4();
        let driver = actor(Role::Driver, org);
        assert!(can_perform(&driver, Capability::SubmitTrip, org));
        assert!(can_perform(&driver, Capability::EditTripItems, org));
        assert!(!can_perform(&driver, Capability::ReviewTrip, org));
        assert!(!can_perform(&driver, Capability::RunSweep, org));
    }

    #[test]
    fn supervisor_reviews_within_own_org_only() {
        let org = Uuid::new_v4();
        let supervisor = actor(Role::Supervisor, org);
        assert!(can_perform(&supervisor, Capability::ReviewTrip, org));
        assert!(!can_perform(
            &supervisor,
            Capability::ReviewTrip,
            Uuid::new_v4()
        ));
    }

    #[test]
    fn admin_crosses_org_boundaries() {
        let admin = actor(Role::Admin, Uuid::new_v4());
        let other_org = Uuid::new_v4();
        assert!(can_perform(&admin, Capability::ReviewTrip, other_org));
        assert!(can_perform(&admin, Capability::DefineGlobalRules, other_org));
        assert!(can_see(&admin, other_org));
        assert!(can_always_write(&admin));
    }

    #[test]
    fn non_admins_cannot_define_global_rules() {
        let org = Uuid::new_v4();
        assert!(!can_perform(
            &actor(Role::Supervisor, org),
            Capability::DefineGlobalRules,
            org
        ));
        assert!(!can_perform(
            &actor(Role::Driver, org),
            Capability::DefineGlobalRules,
            org
        ));
    }

    #[test]
    fn visibility_is_org_scoped() {
        let org = Uuid::new_v4();
        let driver = actor(Role::Driver, org);
        assert!(can_see(&driver, org));
        assert!(!can_see(&driver, Uuid::new_v4()));
    }

    #[test]
    fn only_admin_bypasses_state_gating() {
        let org = Uuid::new_v4();
        assert!(!can_always_write(&actor(Role::Driver, org)));
        assert!(!can_always_write(&actor(Role::Supervisor, org)));
        assert!(can_always_write(&actor(Role::Admin, org)));
    }
}
