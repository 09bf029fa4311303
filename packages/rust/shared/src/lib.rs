//! Shared types, error model, and configuration for biddoc.
//!
//! This crate is the foundation depended on by all other biddoc crates.
//! It provides:
//! - [`BidDocError`]: the unified error type
//! - The form data model ([`BiddingFormData`]) and the template data
//!   contract ([`TemplateData`])
//! - Configuration ([`AppConfig`], [`ExportConfig`], config loading)
//! - Form validation ([`validate_form`])
//! - Atomic file writes ([`write_atomic`])

pub mod atomic;
pub mod config;
pub mod error;
pub mod types;
pub mod validate;

// Re-export public API at crate root for ergonomic imports.
pub use atomic::write_atomic;
pub use config::{
    ApiConfig, AppConfig, DEFAULT_OUTPUT_PREFIX, DraftsConfig, ExportConfig, ExportSection,
    SubjectEntry, config_dir, config_file_path, drafts_dir, init_config, load_config,
    load_config_from, validate_config,
};
pub use error::{BidDocError, Result};
pub use types::{
    AgentBid, AlternativeBidPolicy, BankGuaranteeRequirement, BasicInfo, BidBondForm,
    BidderInstructions, BiddingFormData, ComprehensiveScoring, DeliveryDateMode, DocumentFeeForm,
    EvaluationMethod, FinancialStatusRequirement, IssueSeverity, NoNegativeDeviation,
    PerformanceBondForm, PerformanceBondPolicy, ProofMaterial, ProofMaterialRequirement,
    QualificationMethod, QualificationRequirementType, RecentProjectRequirement,
    RequirementPresence, ScoringItem, ScoringItemData, ScoringTable, SmallMediumEnterprise,
    TemplateData, YesNo,
};
pub use validate::{
    ValidationIssue, step_name, validate_bid_number, validate_email, validate_form,
    validate_phone_number,
};
