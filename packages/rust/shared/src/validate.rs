//! Input validation for form data.
//!
//! The transformer assumes validated input; this is the gate the CLI (and
//! any other front end) runs before exporting or submitting.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{
    BiddingFormData, DeliveryDateMode, EvaluationMethod, PerformanceBondPolicy,
    RecentProjectRequirement, RequirementPresence, YesNo,
};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$|^0\d{2,3}-?\d{7,8}$").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static BID_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{10,20}$").expect("valid regex"));

/// Mobile (1xx xxxx xxxx) or landline (0xx-xxxxxxx) number.
pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 10–20 ASCII letters or digits.
pub fn validate_bid_number(bid_number: &str) -> bool {
    BID_NUMBER_RE.is_match(bid_number)
}

/// Display name of a 1-based wizard step, empty when out of range.
pub fn step_name(step: u32) -> &'static str {
    match step {
        1 => "基础信息",
        2 => "投标人须知",
        3 => "综合评分法",
        _ => "",
    }
}

/// A single problem found in a form, tied to its JSON field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path, e.g. `basicInfo.contactEmail`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check everything the wizard enforces before allowing an export.
///
/// Returns an empty list for a valid form.
pub fn validate_form(form: &BiddingFormData) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut push = |field: &str, message: &str| {
        issues.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    };

    let basic = &form.basic_info;
    let required = [
        ("basicInfo.bidSubject", &basic.bid_subject),
        ("basicInfo.projectName", &basic.project_name),
        ("basicInfo.bidNumber", &basic.bid_number),
        ("basicInfo.equipmentName", &basic.equipment_name),
        ("basicInfo.deliveryLocation", &basic.delivery_location),
        ("basicInfo.bidScope", &basic.bid_scope),
        ("basicInfo.contactPerson", &basic.contact_person),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            push(field, "必填");
        }
    }

    if !basic.bid_number.is_empty() && !validate_bid_number(&basic.bid_number) {
        push("basicInfo.bidNumber", "招标编号应为10-20位字母或数字");
    }
    if basic.cover_date.is_none() {
        push("basicInfo.coverDate", "必填");
    }
    match basic.delivery_date_type {
        DeliveryDateMode::Date if basic.delivery_date.is_none() => {
            push("basicInfo.deliveryDate", "必填")
        }
        DeliveryDateMode::Text if basic.delivery_date_text.trim().is_empty() => {
            push("basicInfo.deliveryDateText", "必填")
        }
        _ => {}
    }
    if basic.financial_requirement_type == RequirementPresence::Has
        && basic.financial_requirement_content.trim().is_empty()
    {
        push("basicInfo.financialRequirementContent", "请填写财务要求");
    }
    if basic.performance_requirement_type == RequirementPresence::Has {
        if basic.performance_years == 0 {
            push("basicInfo.performanceYears", "业绩年限应大于0");
        }
        if basic.performance_count == 0 {
            push("basicInfo.performanceCount", "业绩数量应大于0");
        }
    }
    if basic.accept_joint_bid == YesNo::Yes && basic.joint_bid_max_members == Some(0) {
        push("basicInfo.jointBidMaxMembers", "联合体成员数量应大于0");
    }
    if !validate_phone_number(&basic.contact_phone) {
        push("basicInfo.contactPhone", "联系电话格式不正确");
    }
    if !validate_email(&basic.contact_email) {
        push("basicInfo.contactEmail", "联系邮箱格式不正确");
    }

    let instr = &form.bidder_instructions;
    if instr.require_bid_bond.is_none() {
        push("bidderInstructions.requireBidBond", "必选");
    }
    if instr.require_bid_bond == Some(true) && instr.bid_bond_amount.is_none() {
        push("bidderInstructions.bidBondAmount", "请填写保证金金额");
    }
    if instr.has_special_qualification_req == Some(true)
        && instr.special_qualification_requirement.trim().is_empty()
    {
        push(
            "bidderInstructions.specialQualificationRequirement",
            "请填写资格审查资料具体要求",
        );
    }
    if instr.recent_project_requirement_type == RecentProjectRequirement::Applicable {
        match (instr.recent_project_start_year, instr.recent_project_end_year) {
            (Some(start), Some(end)) if start > end => push(
                "bidderInstructions.recentProjectEndYear",
                "截止年份不能早于起始年份",
            ),
            (None, _) => push("bidderInstructions.recentProjectStartYear", "必填"),
            (_, None) => push("bidderInstructions.recentProjectEndYear", "必填"),
            _ => {}
        }
    }
    if instr.require_performance_bond == PerformanceBondPolicy::Required
        && instr.performance_bond_amount.is_none()
    {
        push(
            "bidderInstructions.performanceBondAmount",
            "请填写履约保证金金额",
        );
    }
    if instr.has_max_bid_price == Some(true) && instr.max_bid_price.is_none() {
        push("bidderInstructions.maxBidPrice", "请填写最高投标限价");
    }
    if instr.require_bid_document_fee == Some(true) && instr.bid_document_fee_amount.is_none() {
        push("bidderInstructions.bidDocumentFeeAmount", "请填写标书费金额");
    }

    if instr.evaluation_method_type == EvaluationMethod::Comprehensive {
        if let Some(scoring) = &form.comprehensive_scoring {
            let tables = [
                ("commercialScoring", &scoring.commercial_scoring),
                ("technicalScoring", &scoring.technical_scoring),
                ("priceScoring", &scoring.price_scoring),
            ];
            for (name, table) in tables {
                for (i, item) in table.items.iter().enumerate() {
                    if item.score.is_some_and(|s| !s.is_finite() || s < 0.0) {
                        push(
                            &format!("comprehensiveScoring.{name}.items[{i}].score"),
                            "分值应为非负数",
                        );
                    }
                }
            }
        }
    }

    issues
}
