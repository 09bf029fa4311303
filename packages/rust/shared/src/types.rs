//! Core domain types for biddoc: the bidding form model and the flat
//! template data contract consumed by the document templating engine.
//!
//! The JSON shape matches the form wizard (camelCase fields, kebab-case
//! enum literals), so drafts and backend submissions stay interchangeable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Discriminants (basic info)
// ---------------------------------------------------------------------------

/// How the delivery date is captured: a calendar date or free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryDateMode {
    #[default]
    Date,
    Text,
}

/// Qualification requirement selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualificationRequirementType {
    /// Standard independent-legal-entity clause.
    #[default]
    Option1,
    /// Custom text supplied in `qualificationRequirementOther`.
    Option2,
    /// No requirement.
    Option3,
}

/// `has` / `none` selector used by the financial and performance requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementPresence {
    #[default]
    #[serde(rename = "has")]
    Has,
    #[serde(rename = "none")]
    Absent,
}

/// Plain yes/no choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

/// Whether agents may bid on behalf of manufacturers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentBid {
    #[default]
    Accept,
    Reject,
}

/// Supplier issue-record severity the bidder must not have triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Major,
    Serious,
    #[default]
    All,
}

// ---------------------------------------------------------------------------
// Discriminants (bidder instructions)
// ---------------------------------------------------------------------------

/// Bid evaluation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMethod {
    #[default]
    Comprehensive,
    LowestPrice,
}

/// Accepted bid bond instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BidBondForm {
    BankTransfer,
    CommitmentLetter,
}

/// Qualification review mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualificationMethod {
    #[default]
    PostReview,
    PreReview,
}

/// Financial statement requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinancialStatusRequirement {
    #[default]
    NotApplicable,
    ApplicableOneYear,
    /// Refined by `financialReportYears`.
    ApplicableRecentYears,
}

/// Whether a recent-similar-projects table is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecentProjectRequirement {
    #[default]
    NotApplicable,
    Applicable,
}

/// Kinds of material accepted as proof of past performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProofMaterial {
    Contract,
    BidNotice,
    AcceptanceReport,
    OwnerProof,
    Other,
}

/// Whether all ticked proof materials are required or any one suffices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMaterialRequirement {
    Any,
    All,
}

/// Alternative bid proposal policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlternativeBidPolicy {
    #[default]
    NotAllowed,
    Allowed,
}

/// Whether the winning bidder must post a performance bond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceBondPolicy {
    #[default]
    NotRequired,
    Required,
}

/// Accepted performance bond instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceBondForm {
    BankGuarantee,
    Cash,
    Check,
    Other,
}

/// Constraints on the bank issuing a guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BankGuaranteeRequirement {
    NoRestriction,
    BranchOrAbove,
}

/// Clauses a bid must respond to without negative deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoNegativeDeviation {
    PaymentTerms,
    DeliveryDate,
    DeliveryLocation,
    ExternalBrand,
    SupplyScope,
    BidValidity,
    QualityWarranty,
    EquipmentSpecs,
    TechnicalAsterisk,
}

/// Accepted bid document fee payment forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentFeeForm {
    BankTransfer,
    Cash,
}

// ---------------------------------------------------------------------------
// BasicInfo
// ---------------------------------------------------------------------------

/// Step 1 of the wizard: subject, project, dates, requirements, contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicInfo {
    /// Bidding subject code (company or subsidiary).
    pub bid_subject: String,
    pub project_name: String,
    pub bid_number: String,
    /// Cover date as epoch milliseconds.
    pub cover_date: Option<i64>,
    pub equipment_name: String,
    pub delivery_date_type: DeliveryDateMode,
    /// Delivery date as epoch milliseconds (date mode).
    pub delivery_date: Option<i64>,
    /// Delivery date as free text (text mode).
    pub delivery_date_text: String,
    pub delivery_location: String,
    pub bid_scope: String,
    pub qualification_requirement_type: QualificationRequirementType,
    pub qualification_requirement_other: String,
    pub financial_requirement_type: RequirementPresence,
    pub financial_requirement_content: String,
    pub performance_requirement_type: RequirementPresence,
    pub performance_years: u32,
    pub performance_type: String,
    pub performance_count: u32,
    pub accept_joint_bid: YesNo,
    /// Cap on consortium members; unset means the default cap of 2.
    pub joint_bid_max_members: Option<u32>,
    pub joint_bid_qualification_requirement: String,
    pub accept_agent_bid: AgentBid,
    pub issue_selection_type: IssueSeverity,
    pub quality_issue_note: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub contact_email: String,
}

impl Default for BasicInfo {
    fn default() -> Self {
        Self {
            bid_subject: String::new(),
            project_name: String::new(),
            bid_number: String::new(),
            cover_date: None,
            equipment_name: String::new(),
            delivery_date_type: DeliveryDateMode::Date,
            delivery_date: None,
            delivery_date_text: String::new(),
            delivery_location: String::new(),
            bid_scope: String::new(),
            qualification_requirement_type: QualificationRequirementType::Option1,
            qualification_requirement_other: String::new(),
            financial_requirement_type: RequirementPresence::Has,
            financial_requirement_content: String::new(),
            performance_requirement_type: RequirementPresence::Has,
            performance_years: 5,
            performance_type: String::new(),
            performance_count: 1,
            accept_joint_bid: YesNo::No,
            joint_bid_max_members: None,
            joint_bid_qualification_requirement: String::new(),
            accept_agent_bid: AgentBid::Accept,
            issue_selection_type: IssueSeverity::All,
            quality_issue_note: "以招标人或上级单位供应商问题记录库为准".into(),
            contact_person: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// BidderInstructions
// ---------------------------------------------------------------------------

/// Step 2 of the wizard: bonds, review mode, project history, fees.
///
/// `Option<bool>` fields are tri-state: unset, yes, no.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BidderInstructions {
    pub bid_section_count: Option<u32>,
    pub evaluation_method_type: EvaluationMethod,
    pub require_bid_bond: Option<bool>,
    /// Bid bond amount in 万元.
    pub bid_bond_amount: Option<f64>,
    pub bid_bond_forms: BTreeSet<BidBondForm>,
    pub qualification_method: QualificationMethod,
    pub has_special_qualification_req: Option<bool>,
    pub special_qualification_requirement: String,
    pub financial_status_requirement: FinancialStatusRequirement,
    pub financial_report_years: Option<u32>,
    pub recent_project_requirement_type: RecentProjectRequirement,
    pub recent_project_start_year: Option<i32>,
    pub recent_project_end_year: Option<i32>,
    pub recent_project_type: String,
    pub proof_material_types: BTreeSet<ProofMaterial>,
    pub other_proof_material: String,
    pub proof_material_requirement: BTreeSet<ProofMaterialRequirement>,
    pub recent_project_other_requirements: String,
    pub allow_alternative_bid_proposal: AlternativeBidPolicy,
    pub recommended_candidate_count: Option<u32>,
    pub require_performance_bond: PerformanceBondPolicy,
    pub performance_bond_forms: BTreeSet<PerformanceBondForm>,
    /// Performance bond amount in 万元.
    pub performance_bond_amount: Option<f64>,
    pub bank_guarantee_requirements: BTreeSet<BankGuaranteeRequirement>,
    pub no_negative_deviation_items: BTreeSet<NoNegativeDeviation>,
    pub has_max_bid_price: Option<bool>,
    /// Maximum bid price in 万元.
    pub max_bid_price: Option<f64>,
    pub require_bid_document_fee: Option<bool>,
    /// Bid document fee in 元.
    pub bid_document_fee_amount: Option<f64>,
    pub bid_document_fee_forms: BTreeSet<DocumentFeeForm>,
    pub abort_bid_when_over_budget: Option<YesNo>,
    pub is_small_medium_enterprise: SmallMediumEnterprise,
}

/// Whether bidders are treated as small/medium enterprises. Defaults to yes,
/// unlike the other yes/no selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmallMediumEnterprise {
    #[default]
    Yes,
    No,
}

// ---------------------------------------------------------------------------
// ComprehensiveScoring
// ---------------------------------------------------------------------------

/// One editable row of a scoring table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringItem {
    pub index: u32,
    pub item_name: String,
    pub score: Option<f64>,
    pub scoring_standard: String,
}

/// An ordered list of scoring rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    pub items: Vec<ScoringItem>,
}

/// Step 3 of the wizard, only meaningful for the comprehensive method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComprehensiveScoring {
    pub commercial_scoring: ScoringTable,
    pub technical_scoring: ScoringTable,
    pub price_scoring: ScoringTable,
}

// ---------------------------------------------------------------------------
// BiddingFormData
// ---------------------------------------------------------------------------

/// Complete wizard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BiddingFormData {
    pub basic_info: BasicInfo,
    pub bidder_instructions: BidderInstructions,
    /// Absent in JSON means no scoring block, not the blank one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive_scoring: Option<ComprehensiveScoring>,
}

impl Default for BiddingFormData {
    /// The blank form the wizard starts from.
    fn default() -> Self {
        Self {
            basic_info: BasicInfo::default(),
            bidder_instructions: BidderInstructions::default(),
            comprehensive_scoring: Some(ComprehensiveScoring::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateData
// ---------------------------------------------------------------------------

/// A scoring row as the template sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringItemData {
    pub index: u32,
    pub item_name: String,
    /// Score rendered as text, empty when unscored.
    pub score: String,
    pub scoring_standard: String,
}

/// One value per placeholder of the bidding document template.
///
/// Recomputed on every export, never persisted. Every field is always
/// present; the templating engine treats a missing key as a render error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    // basic info
    pub bid_subject: String,
    pub project_name: String,
    pub bid_number: String,
    pub cover_date: String,
    pub equipment_name: String,
    pub delivery_date: String,
    pub delivery_location: String,
    pub bid_scope: String,
    pub qualification_requirement: String,
    pub financial_requirement: String,
    pub performance_requirement: String,
    pub accept_joint_bid: String,
    pub joint_bid_requirements: String,
    pub accept_agent_bid: String,
    pub quality_issue_note: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub contact_email: String,

    // bidder instructions
    pub bid_section_count: String,
    pub evaluation_method: String,
    pub bid_bond_requirement: String,
    pub qualification_method: String,
    pub special_qualification_requirement: String,
    pub financial_status_requirement: String,
    pub recent_project_requirement: String,
    pub allow_alternative_bid: String,
    pub recommended_candidate_count: String,
    pub performance_bond_requirement: String,
    pub no_negative_deviation_items: String,
    pub max_bid_price: String,
    pub bid_document_fee: String,
    pub abort_bid_when_over_budget: String,
    pub is_small_medium_enterprise: String,

    // comprehensive scoring
    pub commercial_scoring_items: Vec<ScoringItemData>,
    pub technical_scoring_items: Vec<ScoringItemData>,
    pub price_scoring_items: Vec<ScoringItemData>,
}

impl TemplateData {
    /// Flatten into the placeholder dictionary handed to the templating engine.
    pub fn to_context(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form_matches_wizard_defaults() {
        let form = BiddingFormData::default();
        assert_eq!(form.basic_info.performance_years, 5);
        assert_eq!(form.basic_info.performance_count, 1);
        assert_eq!(form.basic_info.joint_bid_max_members, None);
        assert_eq!(
            form.bidder_instructions.is_small_medium_enterprise,
            SmallMediumEnterprise::Yes
        );
        assert!(form.comprehensive_scoring.is_some());
    }

    #[test]
    fn form_uses_wizard_field_names() {
        let json = serde_json::to_value(BiddingFormData::default()).expect("serialize");
        let basic = &json["basicInfo"];
        assert_eq!(basic["qualificationRequirementType"], "option1");
        assert_eq!(basic["financialRequirementType"], "has");
        assert_eq!(basic["acceptJointBid"], "no");
        assert!(basic["jointBidMaxMembers"].is_null());
        let instr = &json["bidderInstructions"];
        assert_eq!(instr["evaluationMethodType"], "comprehensive");
        assert_eq!(instr["financialStatusRequirement"], "not-applicable");
        assert_eq!(instr["requirePerformanceBond"], "not-required");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        // The older blank-form variant omits the joint bid fields entirely.
        let json = r#"{
            "basicInfo": { "projectName": "输送机采购", "performanceRequirementType": "none" },
            "bidderInstructions": {
                "bidBondForms": ["commitment-letter", "bank-transfer", "bank-transfer"],
                "noNegativeDeviationItems": ["delivery-date", "payment-terms"]
            }
        }"#;
        let form: BiddingFormData = serde_json::from_str(json).expect("deserialize");
        assert_eq!(form.basic_info.project_name, "输送机采购");
        assert_eq!(
            form.basic_info.performance_requirement_type,
            RequirementPresence::Absent
        );
        assert_eq!(form.basic_info.joint_bid_max_members, None);
        assert_eq!(form.basic_info.joint_bid_qualification_requirement, "");
        assert!(form.comprehensive_scoring.is_none());

        let forms: Vec<_> = form.bidder_instructions.bid_bond_forms.iter().collect();
        assert_eq!(
            forms,
            vec![&BidBondForm::BankTransfer, &BidBondForm::CommitmentLetter]
        );
        let first = form.bidder_instructions.no_negative_deviation_items.first();
        assert_eq!(first, Some(&NoNegativeDeviation::PaymentTerms));
    }

    #[test]
    fn unknown_enum_literal_is_rejected() {
        let json = r#"{ "basicInfo": { "acceptJointBid": "maybe" } }"#;
        assert!(serde_json::from_str::<BiddingFormData>(json).is_err());
    }

    #[test]
    fn template_context_has_every_key() {
        let ctx = TemplateData::default().to_context();
        assert_eq!(ctx.len(), 36);
        assert!(ctx.contains_key("bidSubject"));
        assert!(ctx.contains_key("isSmallMediumEnterprise"));
        assert!(ctx["commercialScoringItems"].is_array());
    }
}
