//! Test fixtures shared across modules.

use crate::asset::MediaAsset;
use crate::engine::MediaEngine;
use crate::ffmpeg::{EncodeError, FfmpegInvocation};
use crate::inspect::{identifier_from_file_name, InspectError};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// SDR 1080p clip captured on the default birthday
pub(crate) fn asset(identifier: &str, duration_secs: f64) -> MediaAsset {
    MediaAsset {
        identifier: identifier.to_string(),
        path: PathBuf::from(format!("/input/{}.mp4", identifier)),
        capture_date: NaiveDate::from_ymd_opt(2023, 3, 23).unwrap(),
        duration_secs,
        width: 1920,
        height: 1080,
        hdr: false,
        probe: serde_json::json!({"codec_type": "video"}),
    }
}

impl MediaAsset {
    pub(crate) fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub(crate) fn with_hdr(mut self) -> Self {
        self.hdr = true;
        self
    }

    pub(crate) fn with_date(mut self, capture_date: NaiveDate) -> Self {
        self.capture_date = capture_date;
        self
    }
}

/// Engine that records invocations and writes placeholder outputs.
///
/// `inspect` answers from registered templates keyed by identifier (falling
/// back to a 1s clip), with the path replaced by the inspected one.
pub(crate) struct FakeEngine {
    templates: HashMap<String, MediaAsset>,
    executions: RefCell<Vec<FfmpegInvocation>>,
    inspections: Cell<usize>,
    failing_identifier: Option<String>,
    write_outputs: bool,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self {
            templates: HashMap::new(),
            executions: RefCell::new(Vec::new()),
            inspections: Cell::new(0),
            failing_identifier: None,
            write_outputs: true,
        }
    }

    pub(crate) fn with_asset(mut self, template: MediaAsset) -> Self {
        self.templates.insert(template.identifier.clone(), template);
        self
    }

    /// Fail any invocation whose output belongs to `identifier`
    pub(crate) fn failing_on(mut self, identifier: &str) -> Self {
        self.failing_identifier = Some(identifier.to_string());
        self
    }

    /// Report success without writing anything
    pub(crate) fn without_outputs(mut self) -> Self {
        self.write_outputs = false;
        self
    }

    pub(crate) fn executions(&self) -> Vec<FfmpegInvocation> {
        self.executions.borrow().clone()
    }

    pub(crate) fn execution_count(&self) -> usize {
        self.executions.borrow().len()
    }

    pub(crate) fn inspect_count(&self) -> usize {
        self.inspections.get()
    }
}

impl MediaEngine for FakeEngine {
    fn inspect(&self, path: &Path, identifier: Option<&str>) -> Result<MediaAsset, InspectError> {
        self.inspections.set(self.inspections.get() + 1);

        let identifier = match identifier {
            Some(id) => id.to_string(),
            None => identifier_from_file_name(
                &path.file_name().unwrap_or_default().to_string_lossy(),
            ),
        };
        let mut inspected = self
            .templates
            .get(&identifier)
            .cloned()
            .unwrap_or_else(|| asset(&identifier, 1.0));
        inspected.path = path.to_path_buf();
        Ok(inspected)
    }

    fn execute(&self, invocation: &FfmpegInvocation) -> Result<(), EncodeError> {
        self.executions.borrow_mut().push(invocation.clone());

        let produced = invocation.produced_path();
        if self.write_outputs {
            fs::write(produced, b"fake media")?;
        }

        if let Some(failing) = &self.failing_identifier {
            let file_name = produced.file_name().unwrap_or_default().to_string_lossy();
            if file_name.starts_with(&format!("{}-", failing)) {
                return Err(EncodeError::FfmpegFailed {
                    code: 1,
                    stderr: "simulated failure".to_string(),
                });
            }
        }

        Ok(())
    }
}
