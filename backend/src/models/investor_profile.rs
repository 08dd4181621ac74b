//! InvestorProfile model — 1:1 extension of a [`crate::models::user::User`]
//! with role `Investor`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestorType {
    Individual,
    Institutional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccreditationStatus {
    Unaccredited,
    SelfCertified,
    Verified,
}

/// Investor-specific attributes, unique per `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile {
    id: Uuid,
    user_id: Uuid,
    first_name: String,
    last_name: String,
    country: String,
    investor_type: InvestorType,
    risk_tolerance: Option<RiskTolerance>,
    accreditation_status: AccreditationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvestorProfile {
    pub fn new(
        user_id: Uuid,
        first_name: String,
        last_name: String,
        country: String,
        investor_type: InvestorType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            first_name,
            last_name,
            country,
            investor_type,
            risk_tolerance: None,
            accreditation_status: AccreditationStatus::Unaccredited,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn investor_type(&self) -> InvestorType {
        self.investor_type
    }

    pub fn risk_tolerance(&self) -> Option<RiskTolerance> {
        self.risk_tolerance
    }

    pub fn accreditation_status(&self) -> AccreditationStatus {
        self.accreditation_status
    }

    pub fn set_risk_tolerance(&mut self, risk_tolerance: Option<RiskTolerance>) {
        self.risk_tolerance = risk_tolerance;
        self.updated_at = Utc::now();
    }

    pub fn set_accreditation_status(&mut self, status: AccreditationStatus) {
        self.accreditation_status = status;
        self.updated_at = Utc::now();
    }
}
