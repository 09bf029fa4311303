//! Enum → display text tables.
//!
//! Closed enums resolve through [`Label`], whose impls are exhaustive
//! matches. Open-ended codes (the bidding subject) resolve through
//! [`LabelTables`] and fall back to the raw code.

use std::collections::BTreeMap;

use biddoc_shared::{
    AgentBid, AlternativeBidPolicy, BankGuaranteeRequirement, BidBondForm, DocumentFeeForm,
    EvaluationMethod, FinancialStatusRequirement, NoNegativeDeviation, PerformanceBondForm,
    ProofMaterial, QualificationMethod, SmallMediumEnterprise, SubjectEntry, YesNo,
};

/// Built-in bidding subjects (code → legal entity name).
pub const BID_SUBJECT_LABELS: &[(&str, &str)] = &[
    ("company-main", "中冶长天国际工程有限责任公司"),
    ("company-subsidiary-a", "子公司A"),
    ("company-subsidiary-b", "子公司B"),
    ("company-subsidiary-c", "子公司C"),
];

/// Fixed clause for the standard qualification option.
pub const STANDARD_QUALIFICATION: &str =
    "独立法人资格，持有有效的营业执照、基本账户开户许可证或基本存款账户信息表。";

/// Canonical display text of an enum value.
pub trait Label {
    fn label(&self) -> &'static str;
}

impl Label for YesNo {
    fn label(&self) -> &'static str {
        match self {
            Self::Yes => "是",
            Self::No => "否",
        }
    }
}

impl Label for SmallMediumEnterprise {
    fn label(&self) -> &'static str {
        match self {
            Self::Yes => "是",
            Self::No => "否",
        }
    }
}

impl Label for AgentBid {
    fn label(&self) -> &'static str {
        match self {
            Self::Accept => "接受",
            Self::Reject => "不接受",
        }
    }
}

impl Label for EvaluationMethod {
    fn label(&self) -> &'static str {
        match self {
            Self::Comprehensive => "综合评分法",
            Self::LowestPrice => "经评审的最低价中标法",
        }
    }
}

impl Label for QualificationMethod {
    fn label(&self) -> &'static str {
        match self {
            Self::PostReview => "资格后审",
            Self::PreReview => "资格预审",
        }
    }
}

impl Label for FinancialStatusRequirement {
    /// The recent-years variant is composed with a year count elsewhere;
    /// this is its bare label.
    fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "不适用",
            Self::ApplicableOneYear => {
                "投标人应提供经会计事务所或审计机构审计的上一年度财务报表"
            }
            Self::ApplicableRecentYears => "适用",
        }
    }
}

impl Label for AlternativeBidPolicy {
    fn label(&self) -> &'static str {
        match self {
            Self::NotAllowed => "不允许",
            Self::Allowed => "允许",
        }
    }
}

impl Label for BidBondForm {
    fn label(&self) -> &'static str {
        match self {
            Self::BankTransfer => "银行现汇",
            Self::CommitmentLetter => "保证金承诺函",
        }
    }
}

impl Label for PerformanceBondForm {
    fn label(&self) -> &'static str {
        match self {
            Self::BankGuarantee => "银行保函",
            Self::Cash => "现金",
            Self::Check => "支票",
            Self::Other => "其他",
        }
    }
}

impl Label for BankGuaranteeRequirement {
    fn label(&self) -> &'static str {
        match self {
            Self::NoRestriction => "无限制",
            Self::BranchOrAbove => "应由支行及以上国有或股份制商业银行",
        }
    }
}

impl Label for ProofMaterial {
    fn label(&self) -> &'static str {
        match self {
            Self::Contract => "合同/订单",
            Self::BidNotice => "中标通知书/成交通知书",
            Self::AcceptanceReport => "竣工验收报告/验收证明",
            Self::OwnerProof => "业主证明",
            Self::Other => "其他",
        }
    }
}

impl Label for NoNegativeDeviation {
    fn label(&self) -> &'static str {
        match self {
            Self::PaymentTerms => "付款条件",
            Self::DeliveryDate => "交货期",
            Self::DeliveryLocation => "交货地点",
            Self::ExternalBrand => "技术文件中约定的外购件品牌",
            Self::SupplyScope => "供货范围",
            Self::BidValidity => "投标有效期",
            Self::QualityWarranty => "质保期",
            Self::EquipmentSpecs => "设备规格型号及主要参数",
            Self::TechnicalAsterisk => "技术文件中带*号项",
        }
    }
}

impl Label for DocumentFeeForm {
    fn label(&self) -> &'static str {
        match self {
            Self::BankTransfer => "银行现汇",
            Self::Cash => "现金缴纳",
        }
    }
}

/// Map each tag through its label and join with `sep`.
pub fn join_labels<'a, T, I>(tags: I, sep: &str) -> String
where
    T: Label + 'a,
    I: IntoIterator<Item = &'a T>,
{
    tags.into_iter()
        .map(Label::label)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Lookup tables for open-ended codes.
#[derive(Debug, Clone)]
pub struct LabelTables {
    subjects: BTreeMap<String, String>,
}

impl Default for LabelTables {
    fn default() -> Self {
        Self {
            subjects: BID_SUBJECT_LABELS
                .iter()
                .map(|(code, name)| ((*code).to_string(), (*name).to_string()))
                .collect(),
        }
    }
}

impl LabelTables {
    /// Built-in tables extended (or overridden) by configured subjects.
    pub fn with_subjects(extra: &[SubjectEntry]) -> Self {
        let mut tables = Self::default();
        for entry in extra {
            tables
                .subjects
                .insert(entry.code.clone(), entry.name.clone());
        }
        tables
    }

    /// Legal entity name for a subject code, or the code itself when unmapped.
    pub fn subject<'a>(&'a self, code: &'a str) -> &'a str {
        match self.subjects.get(code) {
            Some(name) => name.as_str(),
            None => {
                tracing::debug!(code, "no label for bidding subject, using raw code");
                code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_subject_resolves() {
        let tables = LabelTables::default();
        assert_eq!(tables.subject("company-main"), "中冶长天国际工程有限责任公司");
    }

    #[test]
    fn unmapped_subject_falls_back_to_code() {
        let tables = LabelTables::default();
        assert_eq!(tables.subject("某某集团"), "某某集团");
        assert_eq!(tables.subject(""), "");
    }

    #[test]
    fn configured_subjects_extend_and_override() {
        let tables = LabelTables::with_subjects(&[
            SubjectEntry {
                code: "company-subsidiary-d".into(),
                name: "子公司D".into(),
            },
            SubjectEntry {
                code: "company-subsidiary-a".into(),
                name: "长天重工".into(),
            },
        ]);
        assert_eq!(tables.subject("company-subsidiary-d"), "子公司D");
        assert_eq!(tables.subject("company-subsidiary-a"), "长天重工");
        assert_eq!(tables.subject("company-subsidiary-b"), "子公司B");
    }

    #[test]
    fn join_labels_preserves_iteration_order() {
        let forms = [PerformanceBondForm::BankGuarantee, PerformanceBondForm::Check];
        assert_eq!(join_labels(&forms, "、"), "银行保函、支票");
        let none: [ProofMaterial; 0] = [];
        assert_eq!(join_labels(&none, "、"), "");
    }
}
