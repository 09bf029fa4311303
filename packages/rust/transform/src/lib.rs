//! biddoc-transform: maps a [`BiddingFormData`] onto the flat
//! [`TemplateData`] the document template consumes.
//!
//! The mapping is pure and total: every key is always produced, unset
//! values degrade to empty strings or documented defaults, and calling it
//! twice on the same input yields equal output.

pub mod clauses;
pub mod format;
pub mod labels;

use biddoc_shared::{
    BiddingFormData, ComprehensiveScoring, EvaluationMethod, ExportConfig, ScoringItemData,
    ScoringTable, TemplateData,
};
use chrono::FixedOffset;
use tracing::debug;

use crate::format::{default_offset, format_date_to_chinese, format_score};
use crate::labels::{Label, LabelTables};

/// Lookup tables and time zone used by a transformation.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub labels: LabelTables,
    /// Offset dates are rendered in.
    pub utc_offset: FixedOffset,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            labels: LabelTables::default(),
            utc_offset: default_offset(),
        }
    }
}

impl From<&ExportConfig> for TransformOptions {
    fn from(config: &ExportConfig) -> Self {
        let utc_offset = config
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(default_offset);
        Self {
            labels: LabelTables::with_subjects(&config.subjects),
            utc_offset,
        }
    }
}

/// Transform with the built-in tables and UTC+8 dates.
pub fn transform(form: &BiddingFormData) -> TemplateData {
    transform_with(form, &TransformOptions::default())
}

pub fn transform_with(form: &BiddingFormData, options: &TransformOptions) -> TemplateData {
    let basic = &form.basic_info;
    let instr = &form.bidder_instructions;
    let offset = &options.utc_offset;

    let (commercial, technical, price) = scoring_lists(form);
    debug!(
        bid_number = %basic.bid_number,
        commercial = commercial.len(),
        technical = technical.len(),
        price = price.len(),
        "transformed form data"
    );

    TemplateData {
        bid_subject: options.labels.subject(&basic.bid_subject).to_string(),
        project_name: basic.project_name.clone(),
        bid_number: basic.bid_number.clone(),
        cover_date: format_date_to_chinese(basic.cover_date, offset),
        equipment_name: basic.equipment_name.clone(),
        delivery_date: clauses::delivery_date(basic, offset),
        delivery_location: basic.delivery_location.clone(),
        bid_scope: basic.bid_scope.clone(),
        qualification_requirement: clauses::qualification_requirement(basic),
        financial_requirement: clauses::financial_requirement(basic),
        performance_requirement: clauses::performance_requirement(basic),
        accept_joint_bid: basic.accept_joint_bid.label().into(),
        joint_bid_requirements: clauses::joint_bid_requirements(basic),
        accept_agent_bid: basic.accept_agent_bid.label().into(),
        quality_issue_note: basic.quality_issue_note.clone(),
        contact_person: basic.contact_person.clone(),
        contact_phone: basic.contact_phone.clone(),
        contact_email: basic.contact_email.clone(),

        bid_section_count: format!("{}个", instr.bid_section_count.unwrap_or(1)),
        evaluation_method: instr.evaluation_method_type.label().into(),
        bid_bond_requirement: clauses::bid_bond_requirement(instr),
        qualification_method: instr.qualification_method.label().into(),
        special_qualification_requirement: clauses::special_qualification_requirement(instr),
        financial_status_requirement: clauses::financial_status_requirement(instr),
        recent_project_requirement: clauses::recent_project_requirement(instr),
        allow_alternative_bid: instr.allow_alternative_bid_proposal.label().into(),
        recommended_candidate_count: format!(
            "{}人",
            instr.recommended_candidate_count.unwrap_or(1)
        ),
        performance_bond_requirement: clauses::performance_bond_requirement(instr),
        no_negative_deviation_items: clauses::no_negative_deviation_items(instr),
        max_bid_price: clauses::max_bid_price(instr),
        bid_document_fee: clauses::bid_document_fee(instr),
        abort_bid_when_over_budget: clauses::abort_bid_when_over_budget(instr),
        is_small_medium_enterprise: instr.is_small_medium_enterprise.label().into(),

        commercial_scoring_items: commercial,
        technical_scoring_items: technical,
        price_scoring_items: price,
    }
}

type ScoringLists = (
    Vec<ScoringItemData>,
    Vec<ScoringItemData>,
    Vec<ScoringItemData>,
);

/// Scoring rows only exist for the comprehensive method with a scoring block.
fn scoring_lists(form: &BiddingFormData) -> ScoringLists {
    match (
        form.bidder_instructions.evaluation_method_type,
        &form.comprehensive_scoring,
    ) {
        (EvaluationMethod::Comprehensive, Some(ComprehensiveScoring {
            commercial_scoring,
            technical_scoring,
            price_scoring,
        })) => (
            scoring_rows(commercial_scoring),
            scoring_rows(technical_scoring),
            scoring_rows(price_scoring),
        ),
        (EvaluationMethod::Comprehensive, None) | (EvaluationMethod::LowestPrice, _) => {
            (Vec::new(), Vec::new(), Vec::new())
        }
    }
}

fn scoring_rows(table: &ScoringTable) -> Vec<ScoringItemData> {
    table
        .items
        .iter()
        .map(|item| ScoringItemData {
            index: item.index,
            item_name: item.item_name.clone(),
            score: format_score(item.score),
            scoring_standard: item.scoring_standard.clone(),
        })
        .collect()
}
