//! Clause composition: one function per template block.
//!
//! Each function inspects its discriminant(s) with an exhaustive match and
//! returns the finished text. Fragments are joined with full-width
//! punctuation (`，` `；` `、`) and `\n`, which the templating engine turns
//! into Word line breaks.

use biddoc_shared::{
    BasicInfo, BidderInstructions, DeliveryDateMode, FinancialStatusRequirement,
    PerformanceBondForm, PerformanceBondPolicy, ProofMaterialRequirement,
    QualificationRequirementType, RecentProjectRequirement, RequirementPresence, YesNo,
};
use chrono::FixedOffset;

use crate::format::{format_amount_wan, format_date_to_chinese, format_two_decimals};
use crate::labels::{Label, STANDARD_QUALIFICATION, join_labels};

/// Footnote appended to every performance / project-history clause.
pub const FIRST_UNIT_FOOTNOTE: &str = "注：工业与信息化部等部委颁布的相关名录所列的首台（套）装备、首批次材料、首版次软件参与采购活动时，供应商提交相关证明材料，即视同满足市场占有率、使用业绩等要求。";

/// Text used whenever a requirement does not apply.
pub const NONE_TEXT: &str = "无";

/// Worked example inside the performance clause.
const PERFORMANCE_EXAMPLE: &str =
    "例如投标截止日为2024年6月1日，则近5年是指2019年6月1日至2024年5月31日";

/// Consortium size cap when the form leaves it unset.
const DEFAULT_JOINT_BID_MAX_MEMBERS: u32 = 2;

fn or_default<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.is_empty() { fallback } else { text }
}

fn year_or_blank(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Basic info
// ---------------------------------------------------------------------------

pub fn qualification_requirement(basic: &BasicInfo) -> String {
    match basic.qualification_requirement_type {
        QualificationRequirementType::Option1 => STANDARD_QUALIFICATION.into(),
        QualificationRequirementType::Option2 => {
            or_default(&basic.qualification_requirement_other, NONE_TEXT).into()
        }
        QualificationRequirementType::Option3 => NONE_TEXT.into(),
    }
}

pub fn financial_requirement(basic: &BasicInfo) -> String {
    match basic.financial_requirement_type {
        RequirementPresence::Has => or_default(&basic.financial_requirement_content, "有").into(),
        RequirementPresence::Absent => NONE_TEXT.into(),
    }
}

/// Rolling-window performance clause.
///
/// The worked example in parentheses is fixed text (a five-year window
/// ending 2024-05-31) regardless of `performanceYears`.
pub fn performance_requirement(basic: &BasicInfo) -> String {
    match basic.performance_requirement_type {
        RequirementPresence::Has => {
            let years = basic.performance_years;
            format!(
                "投标人提供近{years}年（指从投标截止日往前推算{years}年，{PERFORMANCE_EXAMPLE}，以合同签订时间为准）类似{kind}业绩至少{count}个。\n{FIRST_UNIT_FOOTNOTE}",
                kind = basic.performance_type,
                count = basic.performance_count,
            )
        }
        RequirementPresence::Absent => NONE_TEXT.into(),
    }
}

/// Consortium clause; empty unless joint bids are accepted.
pub fn joint_bid_requirements(basic: &BasicInfo) -> String {
    match basic.accept_joint_bid {
        YesNo::Yes => {
            let max = basic
                .joint_bid_max_members
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_JOINT_BID_MAX_MEMBERS);
            let mut parts = vec![format!("联合体所有成员数量不得超过{max}家")];
            if !basic.joint_bid_qualification_requirement.is_empty() {
                parts.push(basic.joint_bid_qualification_requirement.clone());
            }
            parts.join("；")
        }
        YesNo::No => String::new(),
    }
}

pub fn delivery_date(basic: &BasicInfo, offset: &FixedOffset) -> String {
    match (basic.delivery_date_type, basic.delivery_date) {
        (DeliveryDateMode::Date, Some(ts)) if ts != 0 => format_date_to_chinese(Some(ts), offset),
        _ => {
            basic.delivery_date_text.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Bidder instructions
// ---------------------------------------------------------------------------

/// `要求，金额为…，形式：…` / `不要求` / empty when undecided.
pub fn bid_bond_requirement(instr: &BidderInstructions) -> String {
    match instr.require_bid_bond {
        Some(true) => {
            let forms = join_labels(&instr.bid_bond_forms, "、");
            format!(
                "要求，金额为{}，形式：{}",
                format_amount_wan(instr.bid_bond_amount),
                or_default(&forms, "银行现汇")
            )
        }
        Some(false) => "不要求".into(),
        None => String::new(),
    }
}

pub fn special_qualification_requirement(instr: &BidderInstructions) -> String {
    match instr.has_special_qualification_req {
        Some(true) => or_default(&instr.special_qualification_requirement, "有").into(),
        Some(false) | None => NONE_TEXT.into(),
    }
}

pub fn financial_status_requirement(instr: &BidderInstructions) -> String {
    match instr.financial_status_requirement {
        FinancialStatusRequirement::ApplicableRecentYears => format!(
            "适用：投标人应递交近{}年度经会计事务所或审计机构审计的财务报表",
            instr.financial_report_years.filter(|n| *n > 0).unwrap_or(1)
        ),
        other @ (FinancialStatusRequirement::NotApplicable
        | FinancialStatusRequirement::ApplicableOneYear) => other.label().into(),
    }
}

/// Project-history clause built from up to five optional fragments, in order:
/// year range, similar-project definition, proof materials (with the
/// "other" note and the all/any qualifier), extra requirements, footnote.
pub fn recent_project_requirement(instr: &BidderInstructions) -> String {
    match instr.recent_project_requirement_type {
        RecentProjectRequirement::NotApplicable => "不适用".into(),
        RecentProjectRequirement::Applicable => {
            let mut text = format!(
                "投标人应提供近{}年至{}年的类似项目情况表，以证明供应商具有承担本项目要求的业绩。",
                year_or_blank(instr.recent_project_start_year),
                year_or_blank(instr.recent_project_end_year),
            );
            if !instr.recent_project_type.is_empty() {
                text.push_str(&format!("\n类似项目是指：{}", instr.recent_project_type));
            }
            if !instr.proof_material_types.is_empty() {
                text.push_str("\n业绩证明材料：");
                text.push_str(&join_labels(&instr.proof_material_types, "、"));
                if !instr.other_proof_material.is_empty() {
                    text.push_str(&format!("（{}）", instr.other_proof_material));
                }
                let required = &instr.proof_material_requirement;
                if required.contains(&ProofMaterialRequirement::All) {
                    text.push_str("，需同时提供上述勾选的所有证明材料");
                } else if required.contains(&ProofMaterialRequirement::Any) {
                    text.push_str("，提供上述勾选的任一项证明材料即可");
                }
            }
            if !instr.recent_project_other_requirements.is_empty() {
                text.push('\n');
                text.push_str(&instr.recent_project_other_requirements);
            }
            text.push('\n');
            text.push_str(FIRST_UNIT_FOOTNOTE);
            text
        }
    }
}

pub fn performance_bond_requirement(instr: &BidderInstructions) -> String {
    match instr.require_performance_bond {
        PerformanceBondPolicy::NotRequired => "不要求".into(),
        PerformanceBondPolicy::Required => {
            let forms = join_labels(&instr.performance_bond_forms, "、");
            let mut text = format!(
                "要求，形式：{}，金额：{}",
                or_default(&forms, "银行保函"),
                format_amount_wan(instr.performance_bond_amount)
            );
            if instr
                .performance_bond_forms
                .contains(&PerformanceBondForm::BankGuarantee)
            {
                let banks = join_labels(&instr.bank_guarantee_requirements, "；");
                if !banks.is_empty() {
                    text.push_str(&format!("，出具保函的银行要求：{banks}"));
                }
            }
            text
        }
    }
}

pub fn no_negative_deviation_items(instr: &BidderInstructions) -> String {
    join_labels(&instr.no_negative_deviation_items, "、")
}

pub fn max_bid_price(instr: &BidderInstructions) -> String {
    match instr.has_max_bid_price {
        Some(true) => format_amount_wan(instr.max_bid_price),
        Some(false) | None => NONE_TEXT.into(),
    }
}

/// Document fee in 元, e.g. `要求，人民币500.00元整，形式：银行现汇`.
pub fn bid_document_fee(instr: &BidderInstructions) -> String {
    match instr.require_bid_document_fee {
        Some(true) => {
            let amount = instr
                .bid_document_fee_amount
                .map(format_two_decimals)
                .unwrap_or_else(|| "0".into());
            let forms = join_labels(&instr.bid_document_fee_forms, "、");
            format!(
                "要求，人民币{amount}元整，形式：{}",
                or_default(&forms, "银行现汇")
            )
        }
        Some(false) | None => "不要求".into(),
    }
}

pub fn abort_bid_when_over_budget(instr: &BidderInstructions) -> String {
    match instr.abort_bid_when_over_budget {
        Some(YesNo::Yes) => "是".into(),
        Some(YesNo::No) | None => "否".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biddoc_shared::{
        BankGuaranteeRequirement, BidBondForm, DocumentFeeForm, NoNegativeDeviation,
        ProofMaterial,
    };

    fn basic() -> BasicInfo {
        BasicInfo::default()
    }

    fn instr() -> BidderInstructions {
        BidderInstructions::default()
    }

    #[test]
    fn qualification_options() {
        let mut b = basic();
        assert_eq!(qualification_requirement(&b), STANDARD_QUALIFICATION);

        b.qualification_requirement_type = QualificationRequirementType::Option2;
        assert_eq!(qualification_requirement(&b), "无");
        b.qualification_requirement_other = "具备特种设备制造许可证".into();
        assert_eq!(qualification_requirement(&b), "具备特种设备制造许可证");

        b.qualification_requirement_type = QualificationRequirementType::Option3;
        assert_eq!(qualification_requirement(&b), "无");
    }

    #[test]
    fn financial_requirement_defaults_to_has_marker() {
        let mut b = basic();
        assert_eq!(financial_requirement(&b), "有");
        b.financial_requirement_content = "近三年无亏损".into();
        assert_eq!(financial_requirement(&b), "近三年无亏损");
        b.financial_requirement_type = RequirementPresence::Absent;
        assert_eq!(financial_requirement(&b), "无");
    }

    #[test]
    fn performance_clause_embeds_years_and_footnote() {
        let mut b = basic();
        b.performance_years = 3;
        b.performance_type = "烧结机".into();
        b.performance_count = 2;
        let text = performance_requirement(&b);
        assert!(text.starts_with("投标人提供近3年（指从投标截止日往前推算3年"));
        assert!(text.contains("则近5年是指2019年6月1日至2024年5月31日"));
        assert!(!text.contains("则近3年"));
        assert!(text.contains("类似烧结机业绩至少2个。\n注："));
        assert!(text.ends_with(FIRST_UNIT_FOOTNOTE));
    }

    #[test]
    fn performance_clause_default_years_matches_fixed_example() {
        let text = performance_requirement(&basic());
        assert!(text.contains("则近5年是指2019年6月1日至2024年5月31日"));
    }

    #[test]
    fn no_performance_requirement_ignores_other_fields() {
        let mut b = basic();
        b.performance_requirement_type = RequirementPresence::Absent;
        b.performance_years = 10;
        b.performance_type = "球团".into();
        assert_eq!(performance_requirement(&b), "无");
    }

    #[test]
    fn joint_bid_only_when_accepted() {
        let mut b = basic();
        b.joint_bid_qualification_requirement = "牵头人须具备甲级资质".into();
        assert_eq!(joint_bid_requirements(&b), "");

        b.accept_joint_bid = YesNo::Yes;
        assert_eq!(
            joint_bid_requirements(&b),
            "联合体所有成员数量不得超过2家；牵头人须具备甲级资质"
        );

        b.joint_bid_max_members = Some(3);
        b.joint_bid_qualification_requirement.clear();
        assert_eq!(joint_bid_requirements(&b), "联合体所有成员数量不得超过3家");
    }

    #[test]
    fn delivery_date_modes() {
        let offset = crate::format::default_offset();
        let mut b = basic();
        b.delivery_date = Some(1_704_384_000_000);
        b.delivery_date_text = "合同签订后90天".into();
        assert_eq!(delivery_date(&b, &offset), "2024年1月5日");

        b.delivery_date_type = DeliveryDateMode::Text;
        assert_eq!(delivery_date(&b, &offset), "合同签订后90天");

        b.delivery_date_type = DeliveryDateMode::Date;
        b.delivery_date = None;
        assert_eq!(delivery_date(&b, &offset), "合同签订后90天");

        b.delivery_date = Some(0);
        assert_eq!(delivery_date(&b, &offset), "合同签订后90天");
    }

    #[test]
    fn bid_bond_tri_state() {
        let mut i = instr();
        assert_eq!(bid_bond_requirement(&i), "");

        i.require_bid_bond = Some(false);
        assert_eq!(bid_bond_requirement(&i), "不要求");

        i.require_bid_bond = Some(true);
        i.bid_bond_amount = Some(50.0);
        assert_eq!(
            bid_bond_requirement(&i),
            "要求，金额为50.00万元，形式：银行现汇"
        );

        i.bid_bond_forms.insert(BidBondForm::CommitmentLetter);
        i.bid_bond_forms.insert(BidBondForm::BankTransfer);
        assert_eq!(
            bid_bond_requirement(&i),
            "要求，金额为50.00万元，形式：银行现汇、保证金承诺函"
        );
    }

    #[test]
    fn special_qualification() {
        let mut i = instr();
        assert_eq!(special_qualification_requirement(&i), "无");
        i.has_special_qualification_req = Some(true);
        assert_eq!(special_qualification_requirement(&i), "有");
        i.special_qualification_requirement = "提供近三年纳税证明".into();
        assert_eq!(special_qualification_requirement(&i), "提供近三年纳税证明");
    }

    #[test]
    fn financial_status_variants() {
        let mut i = instr();
        assert_eq!(financial_status_requirement(&i), "不适用");

        i.financial_status_requirement = FinancialStatusRequirement::ApplicableOneYear;
        assert_eq!(
            financial_status_requirement(&i),
            "投标人应提供经会计事务所或审计机构审计的上一年度财务报表"
        );

        i.financial_status_requirement = FinancialStatusRequirement::ApplicableRecentYears;
        assert_eq!(
            financial_status_requirement(&i),
            "适用：投标人应递交近1年度经会计事务所或审计机构审计的财务报表"
        );
        i.financial_report_years = Some(3);
        assert!(financial_status_requirement(&i).contains("近3年度"));
    }

    #[test]
    fn recent_projects_minimal() {
        let mut i = instr();
        assert_eq!(recent_project_requirement(&i), "不适用");

        i.recent_project_requirement_type = RecentProjectRequirement::Applicable;
        i.recent_project_start_year = Some(2020);
        i.recent_project_end_year = Some(2024);
        assert_eq!(
            recent_project_requirement(&i),
            format!(
                "投标人应提供近2020年至2024年的类似项目情况表，以证明供应商具有承担本项目要求的业绩。\n{FIRST_UNIT_FOOTNOTE}"
            )
        );
    }

    #[test]
    fn recent_projects_full_composition() {
        let mut i = instr();
        i.recent_project_requirement_type = RecentProjectRequirement::Applicable;
        i.recent_project_start_year = Some(2020);
        i.recent_project_end_year = None;
        i.recent_project_type = "带式焙烧机工程".into();
        i.proof_material_types.insert(ProofMaterial::Other);
        i.proof_material_types.insert(ProofMaterial::Contract);
        i.other_proof_material = "发票".into();
        i.proof_material_requirement.insert(ProofMaterialRequirement::Any);
        i.proof_material_requirement.insert(ProofMaterialRequirement::All);
        i.recent_project_other_requirements = "业绩须为独立完成".into();

        let expected = format!(
            "投标人应提供近2020年至年的类似项目情况表，以证明供应商具有承担本项目要求的业绩。\
             \n类似项目是指：带式焙烧机工程\
             \n业绩证明材料：合同/订单、其他（发票），需同时提供上述勾选的所有证明材料\
             \n业绩须为独立完成\n{FIRST_UNIT_FOOTNOTE}"
        );
        assert_eq!(recent_project_requirement(&i), expected);
    }

    #[test]
    fn recent_projects_other_note_needs_materials() {
        let mut i = instr();
        i.recent_project_requirement_type = RecentProjectRequirement::Applicable;
        i.other_proof_material = "发票".into();
        i.proof_material_requirement.insert(ProofMaterialRequirement::Any);
        let text = recent_project_requirement(&i);
        assert!(!text.contains("发票"));
        assert!(!text.contains("任一项"));
    }

    #[test]
    fn performance_bond_with_bank_constraints() {
        let mut i = instr();
        assert_eq!(performance_bond_requirement(&i), "不要求");

        i.require_performance_bond = PerformanceBondPolicy::Required;
        assert_eq!(performance_bond_requirement(&i), "要求，形式：银行保函，金额：");

        i.performance_bond_amount = Some(120.0);
        i.performance_bond_forms.insert(PerformanceBondForm::Cash);
        i.bank_guarantee_requirements
            .insert(BankGuaranteeRequirement::BranchOrAbove);
        assert_eq!(
            performance_bond_requirement(&i),
            "要求，形式：现金，金额：120.00万元"
        );

        i.performance_bond_forms
            .insert(PerformanceBondForm::BankGuarantee);
        i.bank_guarantee_requirements
            .insert(BankGuaranteeRequirement::NoRestriction);
        assert_eq!(
            performance_bond_requirement(&i),
            "要求，形式：银行保函、现金，金额：120.00万元，出具保函的银行要求：无限制；应由支行及以上国有或股份制商业银行"
        );
    }

    #[test]
    fn deviation_items_join() {
        let mut i = instr();
        assert_eq!(no_negative_deviation_items(&i), "");
        i.no_negative_deviation_items
            .insert(NoNegativeDeviation::TechnicalAsterisk);
        i.no_negative_deviation_items
            .insert(NoNegativeDeviation::PaymentTerms);
        assert_eq!(no_negative_deviation_items(&i), "付款条件、技术文件中带*号项");
    }

    #[test]
    fn max_price_and_fee() {
        let mut i = instr();
        assert_eq!(max_bid_price(&i), "无");
        i.has_max_bid_price = Some(true);
        i.max_bid_price = Some(980.0);
        assert_eq!(max_bid_price(&i), "980.00万元");

        assert_eq!(bid_document_fee(&i), "不要求");
        i.require_bid_document_fee = Some(true);
        assert_eq!(bid_document_fee(&i), "要求，人民币0元整，形式：银行现汇");
        i.bid_document_fee_amount = Some(500.0);
        i.bid_document_fee_forms.insert(DocumentFeeForm::Cash);
        assert_eq!(bid_document_fee(&i), "要求，人民币500.00元整，形式：现金缴纳");
        i.bid_document_fee_amount = Some(312.125);
        assert_eq!(bid_document_fee(&i), "要求，人民币312.13元整，形式：现金缴纳");
    }

    #[test]
    fn abort_when_over_budget() {
        let mut i = instr();
        assert_eq!(abort_bid_when_over_budget(&i), "否");
        i.abort_bid_when_over_budget = Some(YesNo::Yes);
        assert_eq!(abort_bid_when_over_budget(&i), "是");
    }
}
