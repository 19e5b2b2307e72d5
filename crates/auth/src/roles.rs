use serde::{Deserialize, Serialize};

/// Role of a principal.
///
/// The set is closed: adding a role means touching every exhaustive match
/// below (`family`, `as_str`) and deciding which route sets admit it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; the only role without a tenant.
    SuperAdmin,
    HospitalAdmin,
    Doctor,
    Nurse,
    Pharmacist,
    LabStaff,
    Receptionist,
    Patient,
}

/// Coarse grouping of roles, used for token lifetimes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RoleFamily {
    Platform,
    Administrative,
    Clinical,
    Patient,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::SuperAdmin,
        Role::HospitalAdmin,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::LabStaff,
        Role::Receptionist,
        Role::Patient,
    ];

    pub fn family(&self) -> RoleFamily {
        match self {
            Role::SuperAdmin => RoleFamily::Platform,
            Role::HospitalAdmin => RoleFamily::Administrative,
            Role::Doctor | Role::Nurse | Role::Pharmacist | Role::LabStaff | Role::Receptionist => {
                RoleFamily::Clinical
            }
            Role::Patient => RoleFamily::Patient,
        }
    }

    /// Whether principals with this role must belong to a hospital.
    pub fn is_tenant_bound(&self) -> bool {
        !matches!(self.family(), RoleFamily::Platform)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::HospitalAdmin => "hospital_admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Pharmacist => "pharmacist",
            Role::LabStaff => "lab_staff",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed set of roles admitted by a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    /// Platform routes.
    pub const PLATFORM: RoleSet = RoleSet(&[Role::SuperAdmin]);

    pub const HOSPITAL_ADMIN: RoleSet = RoleSet(&[Role::HospitalAdmin]);

    /// Clinical routes: hospital staff of any kind, plus their administrator.
    pub const STAFF_OR_ADMIN: RoleSet = RoleSet(&[
        Role::HospitalAdmin,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::LabStaff,
        Role::Receptionist,
    ]);

    pub const PATIENT: RoleSet = RoleSet(&[Role::Patient]);

    /// Routes that serve a record to the staff who wrote it or the patient it is about.
    pub const CARE_VIEWERS: RoleSet = RoleSet(&[
        Role::HospitalAdmin,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::LabStaff,
        Role::Receptionist,
        Role::Patient,
    ]);

    /// Any authenticated principal.
    pub const ANY: RoleSet = RoleSet(&Role::ALL);

    /// Roles a hospital administrator may provision as staff.
    pub const PROVISIONABLE_STAFF: RoleSet = RoleSet(&[
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::LabStaff,
        Role::Receptionist,
    ]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}
