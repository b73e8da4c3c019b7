//! Filter composer.
//!
//! Each clip's final look is an ordered list of [`FilterStep`]s: tone-map HDR
//! footage, crop to portrait, then burn in the age caption. The list is built
//! from the configuration and rendered into one ffmpeg filter chain.

use crate::asset::MediaAsset;
use crate::caption::{age_label, CaptionPosition};
use crate::ffmpeg::{escape_filter_value, FfmpegInvocation, FilterGraph, InputSpec, OutputTarget};
use crate::plan::PlanError;
use crate::stage::Stage;
use chrono::NaiveDate;
use kids_timelapse_config::Config;
use std::path::Path;

pub const FILTER_STAGE: &str = "compiled";

/// BT.2020 HLG/PQ to BT.709 SDR via linear light and the Hable curve
pub const TONE_MAP_CHAIN: &str = "zscale=t=linear:npl=100,format=gbrpf32le,zscale=p=bt709,\
tonemap=tonemap=hable:desat=0,zscale=t=bt709:m=bt709:r=tv,format=yuv420p";

const CAPTION_FONT_SIZE: u32 = 36;
const CAPTION_FONT_COLOR: &str = "white";

#[derive(Debug, Clone, PartialEq)]
pub enum FilterStep {
    ToneMap,
    Crop {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    },
    Overlay {
        text: String,
        position: CaptionPosition,
        font_size: u32,
        font_color: String,
    },
}

impl FilterStep {
    /// Centred 9:16 crop for a frame bounded by `max_width` x `max_height`.
    ///
    /// The width is rounded down to an even pixel count.
    pub fn portrait_crop(max_width: u32, max_height: u32) -> Self {
        let width = (max_height as u64 * 9 / 16) as u32 & !1;
        FilterStep::Crop {
            width,
            height: max_height,
            x: max_width.saturating_sub(width) / 2,
            y: 0,
        }
    }

    fn render(&self) -> String {
        match self {
            FilterStep::ToneMap => TONE_MAP_CHAIN.to_string(),
            FilterStep::Crop { width, height, x, y } => {
                format!("crop={}:{}:{}:{}", width, height, x, y)
            }
            FilterStep::Overlay {
                text,
                position,
                font_size,
                font_color,
            } => format!(
                "drawtext=text={}:x={}:y={}:fontsize={}:fontcolor={}",
                escape_filter_value(text),
                position.x(),
                position.y(),
                font_size,
                font_color
            ),
        }
    }
}

/// Render steps, in order, as one comma-separated chain
pub fn render_filter_chain(steps: &[FilterStep]) -> String {
    steps
        .iter()
        .map(FilterStep::render)
        .collect::<Vec<_>>()
        .join(",")
}

/// Chooses the filter steps for each clip
#[derive(Debug, Clone, PartialEq)]
pub struct FilterComposer {
    birthday: NaiveDate,
    crop: Option<FilterStep>,
    caption_position: CaptionPosition,
}

impl FilterComposer {
    pub fn from_config(config: &Config) -> Self {
        let video = &config.timelapse_video;
        Self {
            birthday: config.kid_info.birthday,
            crop: video
                .instagram_style
                .then(|| FilterStep::portrait_crop(video.max_width, video.max_height)),
            caption_position: CaptionPosition::from_centered(
                config.timelapse_options.list_weeks_centered,
            ),
        }
    }

    pub fn compose(&self, asset: &MediaAsset) -> Vec<FilterStep> {
        let mut steps = Vec::with_capacity(3);

        if asset.hdr {
            steps.push(FilterStep::ToneMap);
        }
        if let Some(crop) = &self.crop {
            steps.push(crop.clone());
        }
        steps.push(FilterStep::Overlay {
            text: age_label(asset.capture_date, self.birthday),
            position: self.caption_position,
            font_size: CAPTION_FONT_SIZE,
            font_color: CAPTION_FONT_COLOR.to_string(),
        });

        steps
    }
}

/// Final per-clip stage: tone-map, crop and caption
#[derive(Debug, Clone)]
pub struct FilterStage {
    composer: FilterComposer,
}

impl FilterStage {
    pub fn new(composer: FilterComposer) -> Self {
        Self { composer }
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &str {
        FILTER_STAGE
    }

    fn build(&self, asset: &MediaAsset, output: &Path) -> Result<FfmpegInvocation, PlanError> {
        let chain = render_filter_chain(&self.composer.compose(asset));
        Ok(FfmpegInvocation::new(OutputTarget::Encode(output.to_path_buf()))
            .input(InputSpec::new(&asset.path))
            .filter(FilterGraph::Chain(chain)))
    }
}
