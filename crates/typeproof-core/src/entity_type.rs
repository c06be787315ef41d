//! # Entity Types: Single Source of Truth
//!
//! Defines the closed table of entity types an attester can vouch for.
//! Every type has a stable label (`AI.CA`), a stable numeric code that the
//! circuits consume as a public signal, and a category.
//!
//! ## Security Invariant
//!
//! The code is `category << 8 | subtype`. A code outside the table never
//! maps to a type: the gateway rejects such proofs at the boundary instead
//! of treating them as an "unknown" catch-all. Adding a type forces every
//! exhaustive `match` in the workspace to handle it.
//!
//! | Label | Code   | Category | Description |
//! |-------|--------|----------|-------------|
//! | AI.CA | 0x0101 | AI       | Conversational agent |
//! | AI.AA | 0x0102 | AI       | Autonomous agent |
//! | AI.CG | 0x0103 | AI       | Content generator |
//! | AI.AN | 0x0104 | AI       | Analytical system |
//! | RB.IN | 0x0201 | Robot    | Industrial robot |
//! | RB.SV | 0x0202 | Robot    | Service robot |
//! | RB.HU | 0x0203 | Robot    | Humanoid robot |
//! | RB.DR | 0x0204 | Robot    | Autonomous drone or vehicle |
//! | HU.US | 0x0301 | Human    | Human user |
//! | HU.VR | 0x0302 | Human    | Verified human |
//! | HU.OP | 0x0303 | Human    | Human operator |
//! | HY.CY | 0x0401 | Hybrid   | Augmented human |
//! | HY.HS | 0x0402 | Hybrid   | Human-supervised AI |
//! | HY.AH | 0x0403 | Hybrid   | AI-assisted human |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::field::FieldElement;

/// Number of entries in the type table.
pub const ENTITY_TYPE_COUNT: usize = 14;

/// Top-level grouping of entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Software agents.
    Ai,
    /// Embodied machines.
    Robot,
    /// Natural persons.
    Human,
    /// Human/machine combinations.
    Hybrid,
}

impl EntityCategory {
    /// The two-letter label prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Robot => "RB",
            Self::Human => "HU",
            Self::Hybrid => "HY",
        }
    }

    /// The high byte of every code in this category.
    pub fn code(&self) -> u16 {
        match self {
            Self::Ai => 0x01,
            Self::Robot => 0x02,
            Self::Human => 0x03,
            Self::Hybrid => 0x04,
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A claimable entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// Conversational agent.
    #[serde(rename = "AI.CA")]
    AiConversationalAgent,
    /// Autonomous agent acting without a human in the loop.
    #[serde(rename = "AI.AA")]
    AiAutonomousAgent,
    /// Content generator.
    #[serde(rename = "AI.CG")]
    AiContentGenerator,
    /// Analytical system.
    #[serde(rename = "AI.AN")]
    AiAnalyticalSystem,
    /// Industrial robot.
    #[serde(rename = "RB.IN")]
    RobotIndustrial,
    /// Service robot.
    #[serde(rename = "RB.SV")]
    RobotService,
    /// Humanoid robot.
    #[serde(rename = "RB.HU")]
    RobotHumanoid,
    /// Autonomous drone or vehicle.
    #[serde(rename = "RB.DR")]
    RobotDrone,
    /// Human user.
    #[serde(rename = "HU.US")]
    HumanUser,
    /// Human whose personhood was verified out of band.
    #[serde(rename = "HU.VR")]
    HumanVerified,
    /// Human operating on behalf of an organization.
    #[serde(rename = "HU.OP")]
    HumanOperator,
    /// Augmented human.
    #[serde(rename = "HY.CY")]
    HybridAugmentedHuman,
    /// AI acting under human supervision.
    #[serde(rename = "HY.HS")]
    HybridSupervisedAi,
    /// Human acting with AI assistance.
    #[serde(rename = "HY.AH")]
    HybridAssistedHuman,
}

impl EntityType {
    /// Every type in the table, in code order.
    pub fn all() -> &'static [EntityType; ENTITY_TYPE_COUNT] {
        &[
            Self::AiConversationalAgent,
            Self::AiAutonomousAgent,
            Self::AiContentGenerator,
            Self::AiAnalyticalSystem,
            Self::RobotIndustrial,
            Self::RobotService,
            Self::RobotHumanoid,
            Self::RobotDrone,
            Self::HumanUser,
            Self::HumanVerified,
            Self::HumanOperator,
            Self::HybridAugmentedHuman,
            Self::HybridSupervisedAi,
            Self::HybridAssistedHuman,
        ]
    }

    /// The category this type belongs to.
    pub fn category(&self) -> EntityCategory {
        match self {
            Self::AiConversationalAgent
            | Self::AiAutonomousAgent
            | Self::AiContentGenerator
            | Self::AiAnalyticalSystem => EntityCategory::Ai,
            Self::RobotIndustrial | Self::RobotService | Self::RobotHumanoid | Self::RobotDrone => {
                EntityCategory::Robot
            }
            Self::HumanUser | Self::HumanVerified | Self::HumanOperator => EntityCategory::Human,
            Self::HybridAugmentedHuman | Self::HybridSupervisedAi | Self::HybridAssistedHuman => {
                EntityCategory::Hybrid
            }
        }
    }

    fn subtype(&self) -> u16 {
        match self {
            Self::AiConversationalAgent
            | Self::RobotIndustrial
            | Self::HumanUser
            | Self::HybridAugmentedHuman => 0x01,
            Self::AiAutonomousAgent
            | Self::RobotService
            | Self::HumanVerified
            | Self::HybridSupervisedAi => 0x02,
            Self::AiContentGenerator
            | Self::RobotHumanoid
            | Self::HumanOperator
            | Self::HybridAssistedHuman => 0x03,
            Self::AiAnalyticalSystem | Self::RobotDrone => 0x04,
        }
    }

    /// The numeric code used as a circuit public signal.
    pub fn code(&self) -> u16 {
        (self.category().code() << 8) | self.subtype()
    }

    /// The stable label, e.g. `AI.CA`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiConversationalAgent => "AI.CA",
            Self::AiAutonomousAgent => "AI.AA",
            Self::AiContentGenerator => "AI.CG",
            Self::AiAnalyticalSystem => "AI.AN",
            Self::RobotIndustrial => "RB.IN",
            Self::RobotService => "RB.SV",
            Self::RobotHumanoid => "RB.HU",
            Self::RobotDrone => "RB.DR",
            Self::HumanUser => "HU.US",
            Self::HumanVerified => "HU.VR",
            Self::HumanOperator => "HU.OP",
            Self::HybridAugmentedHuman => "HY.CY",
            Self::HybridSupervisedAi => "HY.HS",
            Self::HybridAssistedHuman => "HY.AH",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AiConversationalAgent => "Conversational agent",
            Self::AiAutonomousAgent => "Autonomous agent",
            Self::AiContentGenerator => "Content generator",
            Self::AiAnalyticalSystem => "Analytical system",
            Self::RobotIndustrial => "Industrial robot",
            Self::RobotService => "Service robot",
            Self::RobotHumanoid => "Humanoid robot",
            Self::RobotDrone => "Autonomous drone or vehicle",
            Self::HumanUser => "Human user",
            Self::HumanVerified => "Verified human",
            Self::HumanOperator => "Human operator",
            Self::HybridAugmentedHuman => "Augmented human",
            Self::HybridSupervisedAi => "Human-supervised AI",
            Self::HybridAssistedHuman => "AI-assisted human",
        }
    }

    /// Look up a type by numeric code.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::all().iter().copied().find(|t| u64::from(t.code()) == code)
    }

    /// The code embedded as a field element.
    pub fn to_field(&self) -> FieldElement {
        FieldElement::from_u64(u64::from(self.code()))
    }

    /// Decode a type from a public-signal field element.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownEntityType`] if the element is not a code
    /// in the table.
    pub fn from_field(value: &FieldElement) -> Result<Self, ValidationError> {
        value
            .as_u64()
            .and_then(Self::from_code)
            .ok_or_else(|| ValidationError::UnknownEntityType(value.to_hex()))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownEntityType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_complete_and_unique() {
        assert_eq!(EntityType::all().len(), ENTITY_TYPE_COUNT);
        let codes: HashSet<u16> = EntityType::all().iter().map(|t| t.code()).collect();
        let labels: HashSet<&str> = EntityType::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(codes.len(), ENTITY_TYPE_COUNT);
        assert_eq!(labels.len(), ENTITY_TYPE_COUNT);
    }

    #[test]
    fn known_codes() {
        assert_eq!(EntityType::AiConversationalAgent.code(), 0x0101);
        assert_eq!(EntityType::HumanUser.code(), 0x0301);
        assert_eq!(EntityType::HybridAssistedHuman.code(), 0x0403);
        assert_eq!(EntityType::RobotDrone.code(), 0x0204);
    }

    #[test]
    fn label_prefix_matches_category() {
        for t in EntityType::all() {
            assert!(t.as_str().starts_with(t.category().prefix()), "{t}");
        }
    }

    #[test]
    fn code_and_label_lookups_agree() {
        for t in EntityType::all() {
            assert_eq!(EntityType::from_code(u64::from(t.code())), Some(*t));
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), *t);
            assert_eq!(EntityType::from_field(&t.to_field()).unwrap(), *t);
        }
    }

    #[test]
    fn unknown_inputs_rejected() {
        assert!("AI.XX".parse::<EntityType>().is_err());
        assert!("ai.ca".parse::<EntityType>().is_err());
        assert_eq!(EntityType::from_code(0), None);
        assert_eq!(EntityType::from_code(0x0105), None);
        assert!(EntityType::from_field(&FieldElement::from_u64(0x0999)).is_err());
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&EntityType::HumanUser).unwrap();
        assert_eq!(json, "\"HU.US\"");
        for t in EntityType::all() {
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            let back: EntityType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *t);
        }
    }
}
