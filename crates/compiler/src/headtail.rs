//! Head-tail stage: trims long clips to their head and tail and speeds
//! everything up to fit the duration budget.

use crate::asset::MediaAsset;
use crate::budget::DurationBudget;
use crate::ffmpeg::{format_secs, FfmpegInvocation, FilterGraph, InputSpec, OutputTarget};
use crate::plan::{plan_clip, PlanError, TransformPlan};
use crate::stage::Stage;
use std::path::Path;

pub const HEAD_TAIL_STAGE: &str = "unstabilized";

/// Applies the per-clip [`TransformPlan`] and scales to the output width.
#[derive(Debug, Clone, Copy)]
pub struct HeadTailStage {
    budget: DurationBudget,
    max_width: u32,
}

impl HeadTailStage {
    pub fn new(budget: DurationBudget, max_width: u32) -> Self {
        Self { budget, max_width }
    }

    /// Width-bound scale; `-2` keeps the height even for 4:2:0
    fn scale(&self) -> String {
        format!("scale={}:-2", self.max_width)
    }
}

/// Segments that render as `0.000` seconds
fn is_empty_segment(length: f64) -> bool {
    length < 0.0005
}

fn retime(factor: f64) -> String {
    format!("setpts={}*(PTS-STARTPTS)", factor)
}

impl Stage for HeadTailStage {
    fn name(&self) -> &str {
        HEAD_TAIL_STAGE
    }

    fn build(&self, asset: &MediaAsset, output: &Path) -> Result<FfmpegInvocation, PlanError> {
        let invocation = FfmpegInvocation::new(OutputTarget::Encode(output.to_path_buf()));
        let scale = self.scale();

        match plan_clip(asset.duration_secs, &self.budget)? {
            TransformPlan::SpeedUpWhole { factor } => Ok(invocation
                .input(InputSpec::new(&asset.path).no_autorotate())
                .filter(FilterGraph::Chain(format!("setpts={}*PTS,{}", factor, scale)))),

            TransformPlan::SplitHeadTail {
                head_length,
                tail_start,
                tail_length,
                speed_up_factor,
            } => {
                let retime = retime(speed_up_factor);
                let trimmed = |length: f64| {
                    format!("trim=duration={},{},{}", format_secs(length), retime, scale)
                };

                // trim treats a zero duration as unbounded, so empty segments are left out
                match (is_empty_segment(head_length), is_empty_segment(tail_length)) {
                    (true, _) => Ok(invocation
                        .input(InputSpec::new(&asset.path).no_autorotate().seek(tail_start))
                        .filter(FilterGraph::Chain(trimmed(tail_length)))),
                    (false, true) => Ok(invocation
                        .input(InputSpec::new(&asset.path).no_autorotate())
                        .filter(FilterGraph::Chain(trimmed(head_length)))),
                    (false, false) => {
                        // Input 1 is the same file, seeked to the start of the tail
                        let graph = format!(
                            "[0:v]{}[head];[1:v]{}[tail];[head][tail]concat=n=2:v=1:a=0[out]",
                            trimmed(head_length),
                            trimmed(tail_length),
                        );

                        Ok(invocation
                            .input(InputSpec::new(&asset.path).no_autorotate())
                            .input(InputSpec::new(&asset.path).no_autorotate().seek(tail_start))
                            .filter(FilterGraph::Complex {
                                graph,
                                output_label: "out".to_string(),
                            }))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::asset;

    fn stage() -> HeadTailStage {
        let budget = DurationBudget::compute(22.5, 3, 0.5, (2, 1)).unwrap();
        // max 15s, head 10s, tail 5s
        HeadTailStage::new(budget, 1920)
    }

    #[test]
    fn test_long_clip_keeps_head_and_tail() {
        let invocation = stage()
            .build(&asset("a", 60.0), Path::new("/s/a-unstabilized.mp4"))
            .unwrap();

        assert_eq!(invocation.inputs.len(), 2);
        assert_eq!(invocation.inputs[0].seek_secs, None);
        assert_eq!(invocation.inputs[1].seek_secs, Some(55.0));
        assert!(invocation.inputs.iter().all(|input| input.no_autorotate));

        match invocation.filter {
            Some(FilterGraph::Complex { graph, output_label }) => {
                assert_eq!(output_label, "out");
                assert_eq!(
                    graph,
                    "[0:v]trim=duration=10.000,setpts=0.5*(PTS-STARTPTS),scale=1920:-2[head];\
                     [1:v]trim=duration=5.000,setpts=0.5*(PTS-STARTPTS),scale=1920:-2[tail];\
                     [head][tail]concat=n=2:v=1:a=0[out]"
                );
            }
            other => panic!("expected a complex graph, got {:?}", other),
        }
    }

    #[test]
    fn test_short_clip_is_sped_up_whole() {
        let invocation = stage()
            .build(&asset("b", 10.0), Path::new("/s/b-unstabilized.mp4"))
            .unwrap();

        assert_eq!(invocation.inputs.len(), 1);
        assert!(invocation.inputs[0].no_autorotate);
        // (0.5 * 15) / 10 = 0.75
        assert_eq!(
            invocation.filter,
            Some(FilterGraph::Chain("setpts=0.75*PTS,scale=1920:-2".to_string()))
        );
        assert_eq!(invocation.produced_path(), Path::new("/s/b-unstabilized.mp4"));
    }

    #[test]
    fn test_zero_duration_clip_is_rejected() {
        assert_eq!(
            stage().build(&asset("z", 0.0), Path::new("/s/z.mp4")),
            Err(PlanError::InvalidAssetDuration(0.0))
        );
    }

    #[test]
    fn test_tail_only_ratio_drops_head_segment() {
        let budget = DurationBudget::compute(15.0, 1, 0.5, (0, 1)).unwrap();
        let invocation = HeadTailStage::new(budget, 1280)
            .build(&asset("a", 120.0), Path::new("/s/a-unstabilized.mp4"))
            .unwrap();

        assert_eq!(invocation.inputs.len(), 1);
        assert_eq!(invocation.inputs[0].seek_secs, Some(90.0));
        assert_eq!(
            invocation.filter,
            Some(FilterGraph::Chain(
                "trim=duration=30.000,setpts=0.5*(PTS-STARTPTS),scale=1280:-2".to_string()
            ))
        );
        assert!(!invocation.command_line().contains("trim=duration=0.000"));
    }

    #[test]
    fn test_head_only_ratio_drops_tail_segment() {
        let budget = DurationBudget::compute(15.0, 1, 0.5, (1, 0)).unwrap();
        let invocation = HeadTailStage::new(budget, 1280)
            .build(&asset("a", 120.0), Path::new("/s/a-unstabilized.mp4"))
            .unwrap();

        assert_eq!(invocation.inputs.len(), 1);
        assert_eq!(invocation.inputs[0].seek_secs, None);
        assert_eq!(
            invocation.filter,
            Some(FilterGraph::Chain(
                "trim=duration=30.000,setpts=0.5*(PTS-STARTPTS),scale=1280:-2".to_string()
            ))
        );
        assert!(!invocation.command_line().contains("trim=duration=0.000"));
    }
}
