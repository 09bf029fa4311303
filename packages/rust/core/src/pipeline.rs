//! End-to-end export: form → template data → rendered `.docx` → delivery.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument};

use biddoc_docx::{DocxTemplate, EngineOptions};
use biddoc_shared::{BiddingFormData, DEFAULT_OUTPUT_PREFIX, ExportConfig, Result};
use biddoc_transform::{TransformOptions, transform_with};

use crate::delivery::Deliver;
use crate::template::TemplateSource;

pub const PHASE_LOADING: &str = "正在加载模板文件...";
pub const PHASE_TRANSFORMING: &str = "正在处理数据...";
pub const PHASE_RENDERING: &str = "正在生成文档...";
pub const PHASE_DELIVERING: &str = "正在下载文件...";
pub const PHASE_DONE: &str = "导出完成";

/// Default timeout for remote template downloads.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an export run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportState {
    Idle,
    LoadingTemplate,
    Transforming,
    Rendering,
    Serializing,
    Delivering,
    Done,
    Failed,
}

/// Options for a single export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub template: TemplateSource,
    /// File name without the `.docx` extension; derived from the bid
    /// number when unset.
    pub output_file_name: Option<String>,
    pub output_prefix: String,
    pub transform: TransformOptions,
    /// Timeout for remote template downloads.
    pub fetch_timeout: Duration,
}

impl ExportOptions {
    pub fn new(template: TemplateSource) -> Self {
        Self {
            template,
            output_file_name: None,
            output_prefix: DEFAULT_OUTPUT_PREFIX.into(),
            transform: TransformOptions::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Build options from the runtime config.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        Ok(Self {
            template: TemplateSource::parse(&config.template)?,
            output_file_name: None,
            output_prefix: config.output_prefix.clone(),
            transform: TransformOptions::from(config),
            fetch_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Final file name: explicit name or `{prefix}{bidNumber | epoch-ms}`,
    /// with path separators replaced and `.docx` appended.
    pub fn resolve_file_name(&self, bid_number: &str) -> String {
        let stem = match &self.output_file_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ if !bid_number.is_empty() => format!("{}{bid_number}", self.output_prefix),
            _ => format!(
                "{}{}",
                self.output_prefix,
                chrono::Utc::now().timestamp_millis()
            ),
        };
        let stem = stem.strip_suffix(".docx").unwrap_or(&stem);
        let safe: String = stem
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{safe}.docx")
    }
}

/// A delivered document.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Outcome of an export. Failures are reported here, never as `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<ExportedFile>,
    /// `Done` on success, `Failed` otherwise.
    pub state: ExportState,
    /// State the run was in when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<ExportState>,
}

/// Progress callback for reporting export status.
pub trait ProgressReporter: Send + Sync {
    /// Called with a user-facing message when entering a phase.
    fn phase(&self, message: &str);
    /// Called once the run has finished, successfully or not.
    fn done(&self, result: &ExportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _message: &str) {}
    fn done(&self, _result: &ExportResult) {}
}

/// Export without progress reporting.
pub async fn export_document(
    form: &BiddingFormData,
    options: &ExportOptions,
    deliver: &dyn Deliver,
) -> ExportResult {
    export_document_with_progress(form, options, deliver, &SilentProgress).await
}

/// Run the export pipeline, reporting each phase.
///
/// 1. Load the template package
/// 2. Transform the form into template data
/// 3. Render and serialize the package
/// 4. Deliver the finished document
#[instrument(skip_all, fields(run_id = %uuid::Uuid::now_v7(), template = %options.template))]
pub async fn export_document_with_progress(
    form: &BiddingFormData,
    options: &ExportOptions,
    deliver: &dyn Deliver,
    progress: &dyn ProgressReporter,
) -> ExportResult {
    let start = Instant::now();
    let mut state = ExportState::Idle;

    let result = match run(form, options, deliver, progress, &mut state).await {
        Ok(file) => {
            progress.phase(PHASE_DONE);
            info!(
                file = %file.file_name,
                size_bytes = file.size_bytes,
                sha256 = %file.sha256,
                elapsed_ms = start.elapsed().as_millis(),
                "export complete"
            );
            ExportResult {
                success: true,
                error: None,
                file: Some(file),
                state: ExportState::Done,
                failed_at: None,
            }
        }
        Err(e) => {
            error!(failed_at = ?state, error = %e, "export failed");
            ExportResult {
                success: false,
                error: Some(e.to_string()),
                file: None,
                state: ExportState::Failed,
                failed_at: Some(state),
            }
        }
    };

    progress.done(&result);
    result
}

fn advance(state: &mut ExportState, next: ExportState) {
    debug!(from = ?*state, to = ?next, "export state");
    *state = next;
}

async fn run(
    form: &BiddingFormData,
    options: &ExportOptions,
    deliver: &dyn Deliver,
    progress: &dyn ProgressReporter,
    state: &mut ExportState,
) -> Result<ExportedFile> {
    advance(state, ExportState::LoadingTemplate);
    progress.phase(PHASE_LOADING);
    let package = options.template.load(options.fetch_timeout).await?;

    advance(state, ExportState::Transforming);
    progress.phase(PHASE_TRANSFORMING);
    let data = transform_with(form, &options.transform);

    advance(state, ExportState::Rendering);
    progress.phase(PHASE_RENDERING);
    let engine = EngineOptions {
        paragraph_loop: true,
        linebreaks: true,
    };
    let mut template = DocxTemplate::load(&package, engine)?;
    template.render(&data.to_context())?;

    advance(state, ExportState::Serializing);
    let bytes = template.serialize()?;

    advance(state, ExportState::Delivering);
    progress.phase(PHASE_DELIVERING);
    let file_name = options.resolve_file_name(&form.basic_info.bid_number);
    let path = deliver.deliver(&file_name, &bytes)?;

    advance(state, ExportState::Done);
    Ok(ExportedFile {
        file_name,
        path,
        size_bytes: bytes.len(),
        sha256: format!("{:x}", Sha256::digest(&bytes)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::sync::Mutex;

    use biddoc_shared::BidDocError;
    use zip::write::SimpleFileOptions;

    const BODY: &str = concat!(
        "<w:p><w:r><w:t>{projectName}（{bidNumber}）</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{bidBondRequirement}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{#technicalScoringItems}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{index}. {itemName} {score}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{/technicalScoringItems}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{performanceRequirement}</w:t></w:r></w:p>",
    );

    fn template_bytes(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("biddoc-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_template(dir: &std::path::Path, body: &str) -> TemplateSource {
        let path = dir.join("招标文件模板.docx");
        std::fs::write(&path, template_bytes(body)).unwrap();
        TemplateSource::Path(path)
    }

    fn sample_form() -> BiddingFormData {
        let mut form = BiddingFormData::default();
        form.basic_info.project_name = "烧结机改造".into();
        form.basic_info.bid_number = "ZB2024000123".into();
        form.bidder_instructions.require_bid_bond = Some(true);
        form.bidder_instructions.bid_bond_amount = Some(50.0);
        if let Some(scoring) = form.comprehensive_scoring.as_mut() {
            scoring.technical_scoring.items = vec![biddoc_shared::ScoringItem {
                index: 1,
                item_name: "技术方案".into(),
                score: Some(30.0),
                scoring_standard: String::new(),
            }];
        }
        form
    }

    /// Keeps delivered documents in memory.
    #[derive(Default)]
    struct RecordingDelivery {
        delivered: Mutex<Vec<(String, Vec<u8>)>>,
        fail: bool,
    }

    impl Deliver for RecordingDelivery {
        fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
            if self.fail {
                return Err(BidDocError::io(
                    file_name,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((file_name.to_string(), bytes.to_vec()));
            Ok(PathBuf::from(file_name))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        finished: Mutex<Option<bool>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, message: &str) {
            self.phases.lock().unwrap().push(message.to_string());
        }
        fn done(&self, result: &ExportResult) {
            *self.finished.lock().unwrap() = Some(result.success);
        }
    }

    #[tokio::test]
    async fn exports_rendered_document() {
        let tmp = temp_dir();
        let options = ExportOptions::new(write_template(&tmp, BODY));
        let delivery = RecordingDelivery::default();
        let progress = RecordingProgress::default();

        let result = export_document_with_progress(&sample_form(), &options, &delivery, &progress).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.state, ExportState::Done);
        let file = result.file.expect("file");
        assert_eq!(file.file_name, "招标文件_ZB2024000123.docx");
        assert_eq!(file.sha256.len(), 64);

        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec![
                PHASE_LOADING,
                PHASE_TRANSFORMING,
                PHASE_RENDERING,
                PHASE_DELIVERING,
                PHASE_DONE
            ]
        );
        assert_eq!(*progress.finished.lock().unwrap(), Some(true));

        let delivered = delivery.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        let doc = DocxTemplate::load(&delivered[0].1, EngineOptions::default()).unwrap();
        let text = doc.document_text().unwrap();
        assert!(text.starts_with("烧结机改造（ZB2024000123）\n要求，金额为50.00万元，形式：银行现汇\n1. 技术方案 30\n"));
        // The performance clause's footnote lands on its own line.
        assert!(text.contains("业绩至少1个。\n注：工业与信息化部"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn missing_template_fails_without_delivering() {
        let tmp = temp_dir();
        let options = ExportOptions::new(TemplateSource::Path(tmp.join("absent.docx")));
        let delivery = RecordingDelivery::default();
        let progress = RecordingProgress::default();

        let result = export_document_with_progress(&sample_form(), &options, &delivery, &progress).await;

        assert!(!result.success);
        assert_eq!(result.state, ExportState::Failed);
        assert_eq!(result.failed_at, Some(ExportState::LoadingTemplate));
        assert!(result.error.unwrap().contains("absent.docx"));
        assert!(delivery.delivered.lock().unwrap().is_empty());
        assert_eq!(*progress.phases.lock().unwrap(), vec![PHASE_LOADING]);
        assert_eq!(*progress.finished.lock().unwrap(), Some(false));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unknown_placeholder_fails_in_rendering() {
        let tmp = temp_dir();
        let options = ExportOptions::new(write_template(&tmp, "<w:p><w:r><w:t>{tenderAgent}</w:t></w:r></w:p>"));
        let delivery = RecordingDelivery::default();

        let result = export_document(&sample_form(), &options, &delivery).await;

        assert!(!result.success);
        assert_eq!(result.failed_at, Some(ExportState::Rendering));
        assert!(result.error.unwrap().contains("{tenderAgent}"));
        assert!(delivery.delivered.lock().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn delivery_failure_is_reported() {
        let tmp = temp_dir();
        let options = ExportOptions::new(write_template(&tmp, BODY));
        let delivery = RecordingDelivery {
            fail: true,
            ..Default::default()
        };

        let result = export_document(&sample_form(), &options, &delivery).await;

        assert!(!result.success);
        assert_eq!(result.failed_at, Some(ExportState::Delivering));
        assert!(result.error.unwrap().contains("read-only"));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn writes_to_output_directory() {
        let tmp = temp_dir();
        let mut options = ExportOptions::new(write_template(&tmp, BODY));
        options.output_file_name = Some("最终版".into());
        let out = tmp.join("out");
        let delivery = crate::delivery::FileDelivery::new(&out);

        let result = export_document(&sample_form(), &options, &delivery).await;

        let file = result.file.expect("file");
        assert_eq!(file.path, out.join("最终版.docx"));
        assert_eq!(std::fs::read(&file.path).unwrap().len(), file.size_bytes);
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_names() {
        let mut options = ExportOptions::new(TemplateSource::Path("t.docx".into()));
        assert_eq!(options.resolve_file_name("ZB2024000123"), "招标文件_ZB2024000123.docx");

        let generated = options.resolve_file_name("");
        let millis = generated
            .strip_prefix("招标文件_")
            .and_then(|s| s.strip_suffix(".docx"))
            .expect("prefix and extension");
        assert!(millis.parse::<i64>().is_ok());

        options.output_prefix = "标书_".into();
        assert_eq!(options.resolve_file_name("A/B"), "标书_A_B.docx");

        options.output_file_name = Some("合同\\附件.docx".into());
        assert_eq!(options.resolve_file_name("ZB2024000123"), "合同_附件.docx");
    }

    #[test]
    fn options_from_config() {
        let mut config = ExportConfig::from(&biddoc_shared::AppConfig::default());
        config.template = "https://example.com/t.docx".into();
        config.output_prefix = "标书_".into();
        let options = ExportOptions::from_config(&config).unwrap();
        assert!(matches!(options.template, TemplateSource::Url(_)));
        assert_eq!(options.output_prefix, "标书_");
        assert_eq!(options.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn result_serializes_for_scripts() {
        let result = ExportResult {
            success: false,
            error: Some("boom".into()),
            file: None,
            state: ExportState::Failed,
            failed_at: Some(ExportState::LoadingTemplate),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failed_at"], "loading-template");
        assert!(json.get("file").is_none());
    }
}
